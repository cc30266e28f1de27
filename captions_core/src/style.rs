//! # 字幕样式记录
//!
//! 每条字幕携带解析阶段落实好的视觉属性。
//! 颜色一律以 8 位小写十六进制 RGBA 存储，便于编码器做精确匹配。

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// 文本的水平对齐方式，对应 STL TTI 块的 `JC` 字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
pub enum TextAlign {
    /// 左对齐。
    #[strum(serialize = "left")]
    Left,
    /// 居中，未指定对齐时的默认值。
    #[default]
    #[strum(serialize = "center")]
    Center,
    /// 右对齐。
    #[strum(serialize = "right")]
    Right,
}

impl TextAlign {
    /// 从 `tts:textAlign` 属性值解析。`start`/`end` 视为其物理方向，
    /// 无法识别的值回落到居中。
    #[must_use]
    pub fn from_ttml(value: &str) -> Self {
        match value.trim() {
            "left" | "start" => Self::Left,
            "right" | "end" => Self::Right,
            _ => Self::Center,
        }
    }

    /// 对应的 STL `JC` 字节：1 左、2 中、3 右。
    #[must_use]
    pub const fn justification_code(self) -> u8 {
        match self {
            Self::Left => 1,
            Self::Center => 2,
            Self::Right => 3,
        }
    }
}

/// 单条字幕或单个文本段的视觉样式。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyleRecord {
    /// 文档内唯一的样式 id。跨文件解析时由解析会话序号做后缀区分。
    pub id: String,
    /// 字体族名。
    pub font_family: Option<String>,
    /// 字号，原样保留 TTML 的文本值。
    pub font_size: Option<String>,
    /// 前景色，8 位小写十六进制 RGBA。
    pub color: Option<String>,
    /// 背景色，8 位小写十六进制 RGBA。
    pub background_color: Option<String>,
    /// 水平对齐。
    pub text_align: TextAlign,
    /// 斜体。
    pub italic: bool,
    /// 粗体。
    pub bold: bool,
    /// 下划线。
    pub underline: bool,
}

impl StyleRecord {
    /// 以给定 id 创建一个空样式记录。
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// 复制另一条记录的全部视觉字段，换用新 id。
    ///
    /// 只复制 `parent` 已经落实的字段值，不追溯 `parent` 自己的继承来源，
    /// 即继承只有一跳。
    #[must_use]
    pub fn inherit_from(parent: &Self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..parent.clone()
        }
    }

    /// 前景色的 6 位 RGB 部分（不含 alpha），未设置颜色时为 `None`。
    #[must_use]
    pub fn rgb_hex(&self) -> Option<&str> {
        self.color.as_deref().map(|color| &color[..6])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_align_from_ttml() {
        assert_eq!(TextAlign::from_ttml("left"), TextAlign::Left);
        assert_eq!(TextAlign::from_ttml("start"), TextAlign::Left);
        assert_eq!(TextAlign::from_ttml("right"), TextAlign::Right);
        assert_eq!(TextAlign::from_ttml("end"), TextAlign::Right);
        assert_eq!(TextAlign::from_ttml("center"), TextAlign::Center);
        assert_eq!(TextAlign::from_ttml("justify"), TextAlign::Center);
        assert_eq!(TextAlign::from_ttml(""), TextAlign::Center);
    }

    #[test]
    fn test_justification_codes() {
        assert_eq!(TextAlign::Left.justification_code(), 1);
        assert_eq!(TextAlign::Center.justification_code(), 2);
        assert_eq!(TextAlign::Right.justification_code(), 3);
    }

    #[test]
    fn test_inherit_is_single_hop() {
        let mut base = StyleRecord::new("base");
        base.color = Some("ff0000ff".to_string());
        base.italic = true;

        let child = StyleRecord::inherit_from(&base, "child");
        assert_eq!(child.id, "child");
        assert_eq!(child.color.as_deref(), Some("ff0000ff"));
        assert!(child.italic);

        // 继承只复制字段值，修改父记录不影响已生成的子记录
        base.color = Some("00ff00ff".to_string());
        assert_eq!(child.color.as_deref(), Some("ff0000ff"));
    }

    #[test]
    fn test_rgb_hex_strips_alpha() {
        let mut style = StyleRecord::new("s1");
        assert_eq!(style.rgb_hex(), None);
        style.color = Some("00ff0080".to_string());
        assert_eq!(style.rgb_hex(), Some("00ff00"));
    }
}
