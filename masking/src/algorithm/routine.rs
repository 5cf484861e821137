//! Built-in algorithms for common personal data.
//!
//! Each algorithm validates its input against a pattern compiled at
//! construction. Blank input is returned as is; input that does not match is
//! returned trimmed.

use regex::Regex;

use super::Algorithm;
use crate::{directive::Directive, error::ConstructError, Preset};

const MASK_CHAR: char = '*';

fn compile(pattern: &str) -> Result<Regex, ConstructError> {
    Regex::new(pattern).map_err(|err| ConstructError::new(format!("invalid pattern `{pattern}`: {err}")))
}

/// The trimmed value, or `None` when there is nothing to mask.
fn candidate(content: &str) -> Option<&str> {
    let trimmed = content.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Keeps the first and last character. Up to two characters keep only the first.
fn cover_middle(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    match chars.as_slice() {
        [] => String::new(),
        [first] | [first, _] => format!("{first}{MASK_CHAR}"),
        [first, middle @ .., last] => {
            let mut masked = String::with_capacity(value.len());
            masked.push(*first);
            masked.extend(std::iter::repeat(MASK_CHAR).take(middle.len()));
            masked.push(*last);
            masked
        }
    }
}

/// Mainland mobile numbers: `13812345678` becomes `138****5678`.
#[derive(Clone, Debug)]
pub struct PhoneCover {
    pattern: Regex,
}

impl Algorithm for PhoneCover {
    fn mask(&self, content: &str) -> String {
        let Some(phone) = candidate(content) else {
            return content.to_string();
        };
        if !self.pattern.is_match(phone) {
            return phone.to_string();
        }
        format!("{}****{}", &phone[..3], &phone[7..])
    }

    fn construct() -> Result<Self, ConstructError> {
        Ok(Self {
            pattern: compile(r"^1[3-9][0-9]{9}$")?,
        })
    }
}

/// 18-digit ids keep 6 + 4 digits, 15-digit ids keep 6 + 3.
#[derive(Clone, Debug)]
pub struct IdCardCover {
    pattern: Regex,
}

impl Algorithm for IdCardCover {
    fn mask(&self, content: &str) -> String {
        let Some(id) = candidate(content) else {
            return content.to_string();
        };
        if !self.pattern.is_match(id) {
            return id.to_string();
        }
        match id.len() {
            18 => format!("{}********{}", &id[..6], &id[14..]),
            15 => format!("{}******{}", &id[..6], &id[12..]),
            _ => id.to_string(),
        }
    }

    fn construct() -> Result<Self, ConstructError> {
        Ok(Self {
            pattern: compile(r"^(?:[0-9]{15}|[0-9]{18})$")?,
        })
    }
}

/// Masks the local part of an address, keeping the domain.
#[derive(Clone, Debug)]
pub struct EmailCover {
    pattern: Regex,
}

impl Algorithm for EmailCover {
    fn mask(&self, content: &str) -> String {
        let Some(email) = candidate(content) else {
            return content.to_string();
        };
        if !self.pattern.is_match(email) {
            return email.to_string();
        }
        match email.find('@') {
            Some(at) if at > 0 => {
                let (local, domain) = email.split_at(at);
                format!("{}{domain}", cover_middle(local))
            }
            _ => email.to_string(),
        }
    }

    fn construct() -> Result<Self, ConstructError> {
        Ok(Self {
            pattern: compile(r"^[A-Za-z0-9_.-]+@[A-Za-z0-9_.-]+\.[A-Za-z]{2,}$")?,
        })
    }
}

/// Names written in CJK unified ideographs. Single characters are kept.
#[derive(Clone, Debug)]
pub struct ChineseNameCover {
    pattern: Regex,
}

impl ChineseNameCover {
    fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    fn cover(name: &str) -> String {
        if name.chars().nth(1).is_none() {
            name.to_string()
        } else {
            cover_middle(name)
        }
    }
}

impl Algorithm for ChineseNameCover {
    fn mask(&self, content: &str) -> String {
        let Some(name) = candidate(content) else {
            return content.to_string();
        };
        if !self.matches(name) {
            return name.to_string();
        }
        Self::cover(name)
    }

    fn construct() -> Result<Self, ConstructError> {
        Ok(Self {
            pattern: compile(r"^[\x{4e00}-\x{9fa5}]+$")?,
        })
    }
}

/// Names written in ASCII letters only.
#[derive(Clone, Debug)]
pub struct EnglishNameCover {
    pattern: Regex,
}

impl EnglishNameCover {
    fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }
}

impl Algorithm for EnglishNameCover {
    fn mask(&self, content: &str) -> String {
        let Some(name) = candidate(content) else {
            return content.to_string();
        };
        if !self.matches(name) {
            return name.to_string();
        }
        cover_middle(name)
    }

    fn construct() -> Result<Self, ConstructError> {
        Ok(Self {
            pattern: compile(r"^[A-Za-z]+$")?,
        })
    }
}

/// Chinese rule for CJK names, English rule for ASCII names.
#[derive(Clone, Debug)]
pub struct NameCover {
    chinese: ChineseNameCover,
    english: EnglishNameCover,
}

impl Algorithm for NameCover {
    fn mask(&self, content: &str) -> String {
        let Some(name) = candidate(content) else {
            return content.to_string();
        };
        if self.chinese.matches(name) {
            ChineseNameCover::cover(name)
        } else if self.english.matches(name) {
            cover_middle(name)
        } else {
            name.to_string()
        }
    }

    fn construct() -> Result<Self, ConstructError> {
        Ok(Self {
            chinese: ChineseNameCover::construct()?,
            english: EnglishNameCover::construct()?,
        })
    }
}

// =============================================================================
// Presets
// =============================================================================

/// `#[mask_preset(MaskPhone)]`: masks with [`PhoneCover`].
#[derive(Clone, Copy, Debug)]
pub struct MaskPhone;

impl Preset for MaskPhone {
    fn directive() -> Option<Directive> {
        Some(Directive::with::<PhoneCover>())
    }
}

/// `#[mask_preset(MaskEmail)]`: masks with [`EmailCover`].
#[derive(Clone, Copy, Debug)]
pub struct MaskEmail;

impl Preset for MaskEmail {
    fn directive() -> Option<Directive> {
        Some(Directive::with::<EmailCover>())
    }
}

/// `#[mask_preset(MaskIdCard)]`: masks with [`IdCardCover`].
#[derive(Clone, Copy, Debug)]
pub struct MaskIdCard;

impl Preset for MaskIdCard {
    fn directive() -> Option<Directive> {
        Some(Directive::with::<IdCardCover>())
    }
}

/// `#[mask_preset(MaskName)]`: masks with [`NameCover`].
#[derive(Clone, Copy, Debug)]
pub struct MaskName;

impl Preset for MaskName {
    fn directive() -> Option<Directive> {
        Some(Directive::with::<NameCover>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask<A: Algorithm>(content: &str) -> String {
        A::construct().unwrap().mask(content)
    }

    #[test]
    fn phone_keeps_prefix_and_suffix() {
        assert_eq!(mask::<PhoneCover>("13812345678"), "138****5678");
        assert_eq!(mask::<PhoneCover>(" 13812345678 "), "138****5678");
    }

    #[test]
    fn phone_rejects_other_shapes() {
        assert_eq!(mask::<PhoneCover>("12345678901"), "12345678901");
        assert_eq!(mask::<PhoneCover>("1381234567"), "1381234567");
        assert_eq!(mask::<PhoneCover>("   "), "   ");
        assert_eq!(mask::<PhoneCover>(""), "");
    }

    #[test]
    fn id_card_by_length() {
        assert_eq!(mask::<IdCardCover>("110101199001011234"), "110101********1234");
        assert_eq!(mask::<IdCardCover>("110101900101123"), "110101******123");
        assert_eq!(mask::<IdCardCover>("11010119900101123X"), "11010119900101123X");
    }

    #[test]
    fn email_local_part() {
        assert_eq!(mask::<EmailCover>("example@gmail.com"), "e*****e@gmail.com");
        assert_eq!(mask::<EmailCover>("test@qq.com"), "t**t@qq.com");
        assert_eq!(mask::<EmailCover>("ab@test.com"), "a*@test.com");
        assert_eq!(mask::<EmailCover>("a@test.com"), "a*@test.com");
        assert_eq!(mask::<EmailCover>("not-an-email"), "not-an-email");
    }

    #[test]
    fn chinese_names() {
        assert_eq!(mask::<ChineseNameCover>("王"), "王");
        assert_eq!(mask::<ChineseNameCover>("张三"), "张*");
        assert_eq!(mask::<ChineseNameCover>("张三丰"), "张*丰");
        assert_eq!(mask::<ChineseNameCover>("欧阳修文"), "欧**文");
        assert_eq!(mask::<ChineseNameCover>("John"), "John");
    }

    #[test]
    fn english_names() {
        assert_eq!(mask::<EnglishNameCover>("A"), "A*");
        assert_eq!(mask::<EnglishNameCover>("Jo"), "J*");
        assert_eq!(mask::<EnglishNameCover>("John"), "J**n");
        assert_eq!(mask::<EnglishNameCover>("John-Smith"), "John-Smith");
    }

    #[test]
    fn name_cover_picks_rule_by_script() {
        assert_eq!(mask::<NameCover>("张三丰"), "张*丰");
        assert_eq!(mask::<NameCover>("Smith"), "S***h");
        assert_eq!(mask::<NameCover>("王"), "王");
        assert_eq!(mask::<NameCover>("José"), "José");
    }

    #[test]
    fn presets_carry_their_algorithm() {
        assert_eq!(MaskPhone::directive(), Some(Directive::with::<PhoneCover>()));
        assert_eq!(MaskName::directive(), Some(Directive::with::<NameCover>()));
    }
}
