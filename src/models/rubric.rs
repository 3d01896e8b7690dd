//! 评分标准（rubric）数据模型
//!
//! 每道题对应一个单字符评分键，共 `NUM_QUESTIONS` 道题

use serde::Serialize;
use std::fmt;

/// 每份试卷的题目数量
pub const NUM_QUESTIONS: usize = 5;

/// 单道题的评分键
///
/// 只接受可见的 ASCII 字符，修正时前进到下一个 ASCII 字符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RubricKey(u8);

impl RubricKey {
    /// 最后一个可用的评分键
    pub const LAST: RubricKey = RubricKey(b'~');

    /// 从字符创建评分键，非可见 ASCII 字符返回 None
    pub fn new(letter: char) -> Option<Self> {
        if letter.is_ascii_graphic() {
            Some(Self(letter as u8))
        } else {
            None
        }
    }

    pub(crate) fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    pub(crate) fn as_byte(self) -> u8 {
        self.0
    }

    /// 修正后的评分键（序列中的下一个字符）
    ///
    /// `~` 已是最后一个字符，保持不变
    pub fn next(self) -> Self {
        if self == Self::LAST {
            self
        } else {
            Self(self.0 + 1)
        }
    }

    pub fn as_char(self) -> char {
        self.0 as char
    }
}

impl fmt::Display for RubricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// 完整的评分标准
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rubric {
    pub keys: [RubricKey; NUM_QUESTIONS],
}

impl Rubric {
    pub fn new(keys: [RubricKey; NUM_QUESTIONS]) -> Self {
        Self { keys }
    }

    /// 所有题目使用同一个评分键
    pub fn uniform(key: RubricKey) -> Self {
        Self {
            keys: [key; NUM_QUESTIONS],
        }
    }

    /// 渲染为存储格式：每行 `<题号>, <评分键>`
    pub fn to_store_format(&self) -> String {
        self.keys
            .iter()
            .enumerate()
            .map(|(index, key)| format!("{}, {}\n", index + 1, key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rubric_key_rejects_whitespace() {
        assert!(RubricKey::new(' ').is_none());
        assert!(RubricKey::new('\n').is_none());
        assert!(RubricKey::new('é').is_none());
        assert_eq!(RubricKey::new('A').unwrap().as_char(), 'A');
    }

    #[test]
    fn test_rubric_key_next_steps_forward() {
        let a = RubricKey::new('A').unwrap();
        assert_eq!(a.next().as_char(), 'B');
        assert_eq!(a.next().next().as_char(), 'C');
        assert_eq!(RubricKey::new('Z').unwrap().next().as_char(), '[');
    }

    #[test]
    fn test_rubric_key_next_stops_at_last() {
        assert_eq!(RubricKey::LAST.next(), RubricKey::LAST);
    }

    #[test]
    fn test_store_format() {
        let rubric = Rubric::uniform(RubricKey::new('A').unwrap());
        assert_eq!(
            rubric.to_store_format(),
            "1, A\n2, A\n3, A\n4, A\n5, A\n"
        );
    }
}
