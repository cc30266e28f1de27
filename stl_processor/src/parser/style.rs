//! # TTML 解析器 - 样式与颜色解析
//!
//! 把 TTML 的样式属性落实为 [`StyleRecord`]。
//! 属性按固定顺序读取，保证不透明度总是叠加在两个颜色之后。
//! 颜色归一化为 8 位小写十六进制 RGBA。

use std::collections::HashMap;

use captions_core::{ConvertError, StyleRecord, TextAlign};
use quick_xml::{Reader, events::BytesStart};
use tracing::warn;

use super::constants::{
    ATTR_STYLE, ATTR_TTS_BACKGROUND_COLOR, ATTR_TTS_COLOR, ATTR_TTS_FONT_FAMILY,
    ATTR_TTS_FONT_SIZE, ATTR_TTS_FONT_STYLE, ATTR_TTS_FONT_WEIGHT, ATTR_TTS_OPACITY,
    ATTR_TTS_TEXT_ALIGN, ATTR_TTS_TEXT_DECORATION,
};
use super::utils::get_string_attribute;

/// 无法识别的颜色语法回落到的不透明白色。
pub(super) const OPAQUE_WHITE: &str = "ffffffff";

/// 固定的命名颜色表。
const NAMED_COLORS: &[(&str, &str)] = &[
    ("aqua", "00ffffff"),
    ("black", "000000ff"),
    ("blue", "0000ffff"),
    ("cyan", "00ffffff"),
    ("fuchsia", "ff00ffff"),
    ("gray", "808080ff"),
    ("green", "008000ff"),
    ("lime", "00ff00ff"),
    ("magenta", "ff00ffff"),
    ("maroon", "800000ff"),
    ("navy", "000080ff"),
    ("olive", "808000ff"),
    ("purple", "800080ff"),
    ("red", "ff0000ff"),
    ("silver", "c0c0c0ff"),
    ("teal", "008080ff"),
    ("transparent", "00000000"),
    ("white", "ffffffff"),
    ("yellow", "ffff00ff"),
];

/// 解析 TTML 颜色表达式为 8 位小写十六进制 RGBA。
///
/// 支持 `#RRGGBB`、`#RRGGBBAA`、`rgb(r,g,b)`、`rgba(r,g,b,a)`（分量 0–255）
/// 与固定的命名颜色表。其余输入回落到不透明白色并记录警告。
pub(super) fn parse_ttml_color(value: &str, warnings: &mut Vec<String>) -> String {
    let normalized = value.trim().to_ascii_lowercase();

    if let Some(hex) = normalized.strip_prefix('#') {
        if hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return format!("{hex}ff");
        }
        if hex.len() == 8 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return hex.to_string();
        }
    } else if let Some(components) = parse_function_components(&normalized, "rgb") {
        if let [r, g, b] = components[..] {
            return format!("{r:02x}{g:02x}{b:02x}ff");
        }
    } else if let Some(components) = parse_function_components(&normalized, "rgba") {
        if let [r, g, b, a] = components[..] {
            return format!("{r:02x}{g:02x}{b:02x}{a:02x}");
        }
    } else if let Some((_, hex)) = NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == normalized)
    {
        return (*hex).to_string();
    }

    warn!("无法识别的颜色语法 '{value}'，回落到不透明白色");
    warnings.push(format!("无法识别的颜色语法 '{value}'，已替换为不透明白色。"));
    OPAQUE_WHITE.to_string()
}

/// 解析 `name(a,b,...)` 形式的颜色函数，分量按 0–255 的整数读取。
fn parse_function_components(value: &str, name: &str) -> Option<Vec<u8>> {
    let inner = value
        .strip_prefix(name)?
        .trim()
        .strip_prefix('(')?
        .strip_suffix(')')?;
    inner
        .split(',')
        .map(|component| component.trim().parse::<u8>().ok())
        .collect()
}

/// 把不透明度叠加进颜色的 alpha 分量（低 2 位十六进制）。
fn blend_opacity(color: &mut Option<String>, opacity: f32) {
    if let Some(hex) = color.as_mut()
        && hex.len() == 8
        && let Ok(alpha) = u8::from_str_radix(&hex[6..8], 16)
    {
        let blended = (f32::from(alpha) * opacity).round();
        let clamped = if blended >= 255.0 {
            255
        } else if blended <= 0.0 {
            0
        } else {
            blended as u8
        };
        hex.replace_range(6..8, &format!("{clamped:02x}"));
    }
}

/// 落实一个元素上的样式信息。
///
/// 先按 `style="otherId"` 复制被引用记录的已落实字段（只复制一跳），
/// 再按固定顺序应用元素自己的 `tts:*` 属性：
/// 背景色、前景色、字体族、字号、斜体、粗体、不透明度、对齐、下划线。
///
/// 元素不携带任何样式信息时返回 `None`。
pub(super) fn resolve_element_style(
    e: &BytesStart,
    reader: &Reader<&[u8]>,
    id: String,
    styles: &HashMap<String, StyleRecord>,
    style_suffix: u32,
    warnings: &mut Vec<String>,
) -> Result<Option<StyleRecord>, ConvertError> {
    let style_ref = get_string_attribute(e, reader, &[ATTR_STYLE])?;
    let mut touched = false;

    let mut style = if let Some(ref_id) = style_ref {
        let qualified = format!("{ref_id}-{style_suffix}");
        if let Some(parent) = styles.get(&qualified) {
            touched = true;
            StyleRecord::inherit_from(parent, id)
        } else {
            warn!("未知的样式引用 '{ref_id}'");
            warnings.push(format!("未知的样式引用 '{ref_id}'，该引用已被忽略。"));
            StyleRecord::new(id)
        }
    } else {
        StyleRecord::new(id)
    };

    if let Some(value) = get_string_attribute(e, reader, &[ATTR_TTS_BACKGROUND_COLOR])? {
        style.background_color = Some(parse_ttml_color(&value, warnings));
        touched = true;
    }
    if let Some(value) = get_string_attribute(e, reader, &[ATTR_TTS_COLOR])? {
        style.color = Some(parse_ttml_color(&value, warnings));
        touched = true;
    }
    if let Some(value) = get_string_attribute(e, reader, &[ATTR_TTS_FONT_FAMILY])? {
        style.font_family = Some(value);
        touched = true;
    }
    if let Some(value) = get_string_attribute(e, reader, &[ATTR_TTS_FONT_SIZE])? {
        style.font_size = Some(value);
        touched = true;
    }
    if let Some(value) = get_string_attribute(e, reader, &[ATTR_TTS_FONT_STYLE])? {
        style.italic = matches!(value.trim(), "italic" | "oblique");
        touched = true;
    }
    if let Some(value) = get_string_attribute(e, reader, &[ATTR_TTS_FONT_WEIGHT])? {
        style.bold = value.trim() == "bold";
        touched = true;
    }
    if let Some(value) = get_string_attribute(e, reader, &[ATTR_TTS_OPACITY])? {
        match value.trim().parse::<f32>() {
            Ok(opacity) => {
                let clamped = opacity.clamp(0.0, 1.0);
                blend_opacity(&mut style.background_color, clamped);
                blend_opacity(&mut style.color, clamped);
            }
            Err(_) => {
                warnings.push(format!(
                    "不透明度 '{value}' 无法解析，保留原有 alpha 值。"
                ));
            }
        }
        touched = true;
    }
    if let Some(value) = get_string_attribute(e, reader, &[ATTR_TTS_TEXT_ALIGN])? {
        style.text_align = TextAlign::from_ttml(&value);
        touched = true;
    }
    if let Some(value) = get_string_attribute(e, reader, &[ATTR_TTS_TEXT_DECORATION])? {
        style.underline = value.split_whitespace().any(|part| part == "underline");
        touched = true;
    }

    Ok(touched.then_some(style))
}
