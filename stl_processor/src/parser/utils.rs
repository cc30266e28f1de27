//! # TTML 解析器的工具函数
//!
//! 该模块提供了一系列用于处理 TTML 特定数据格式的辅助函数，
//! 例如时间表达式解析和属性提取。

use captions_core::ConvertError;
use quick_xml::{Reader, events::BytesStart};

/// 小数部分最多采信的位数，超出部分直接截断。
const MAX_FRACTION_DIGITS: usize = 6;

/// 解析 TTML 时间表达式到毫秒。
///
/// 支持两类表达式：
/// * 钟面形式 `h:m:s[.frac]` 与 `h:m:s:f`（帧形式需要 `ttp:frameRate`）；
/// * 偏移形式 `<number><metric>`，度量 ∈ {h, m, s, ms, f, t}
///   （`f` 需要 `ttp:frameRate`，`t` 需要 `ttp:tickRate`）。
///
/// 所有换算向下取整。
pub(super) fn parse_time_expression(
    time_str: &str,
    frame_rate: Option<u32>,
    tick_rate: Option<u64>,
) -> Result<u64, ConvertError> {
    let trimmed = time_str.trim();
    if trimmed.is_empty() {
        return Err(ConvertError::InvalidTime("时间表达式为空".to_string()));
    }
    if trimmed.contains(':') {
        parse_clock_expression(trimmed, frame_rate)
    } else {
        parse_offset_expression(trimmed, frame_rate, tick_rate)
    }
}

/// 解析钟面形式 `h:m:s[.frac]` 或 `h:m:s:f`。
fn parse_clock_expression(time_str: &str, frame_rate: Option<u32>) -> Result<u64, ConvertError> {
    let parts: Vec<&str> = time_str.split(':').collect();
    match parts.len() {
        3 => {
            let hours = parse_component(parts[0], "小时", time_str)?;
            let minutes = parse_component(parts[1], "分钟", time_str)?;
            let (seconds, fraction_ms) = parse_seconds_with_fraction(parts[2], time_str)?;
            check_sexagesimal(minutes, "分钟", time_str)?;
            check_sexagesimal(seconds, "秒", time_str)?;
            Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1000 + fraction_ms)
        }
        4 => {
            let Some(fps) = frame_rate.filter(|&fps| fps > 0) else {
                return Err(ConvertError::InvalidTime(format!(
                    "时间戳 '{time_str}' 是帧形式，但文档未声明 ttp:frameRate"
                )));
            };
            let hours = parse_component(parts[0], "小时", time_str)?;
            let minutes = parse_component(parts[1], "分钟", time_str)?;
            let seconds = parse_component(parts[2], "秒", time_str)?;
            let frames = parse_component(parts[3], "帧", time_str)?;
            check_sexagesimal(minutes, "分钟", time_str)?;
            check_sexagesimal(seconds, "秒", time_str)?;
            Ok(hours * 3_600_000
                + minutes * 60_000
                + seconds * 1000
                + frames * 1000 / u64::from(fps))
        }
        _ => Err(ConvertError::InvalidTime(format!(
            "时间戳 '{time_str}' 的钟面形式部分数无效"
        ))),
    }
}

/// 解析偏移形式 `<number><metric>`。
fn parse_offset_expression(
    time_str: &str,
    frame_rate: Option<u32>,
    tick_rate: Option<u64>,
) -> Result<u64, ConvertError> {
    let metric_start = time_str
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .ok_or_else(|| {
            ConvertError::InvalidTime(format!("时间戳 '{time_str}' 缺少时间度量后缀"))
        })?;
    let (number_str, metric) = time_str.split_at(metric_start);
    let (integer, fraction, scale) = parse_decimal_number(number_str, time_str)?;

    // 每个度量单位对应的毫秒数，帧和时钟周期单独换算
    let millis = match metric {
        "h" => scaled_multiply(integer, fraction, scale, 3_600_000),
        "m" => scaled_multiply(integer, fraction, scale, 60_000),
        "s" => scaled_multiply(integer, fraction, scale, 1000),
        "ms" => scaled_multiply(integer, fraction, scale, 1),
        "f" => {
            let Some(fps) = frame_rate.filter(|&fps| fps > 0) else {
                return Err(ConvertError::InvalidTime(format!(
                    "时间戳 '{time_str}' 使用帧度量，但文档未声明 ttp:frameRate"
                )));
            };
            (integer * scale + fraction) * 1000 / (u64::from(fps) * scale)
        }
        "t" => {
            let Some(ticks) = tick_rate.filter(|&ticks| ticks > 0) else {
                return Err(ConvertError::InvalidTime(format!(
                    "时间戳 '{time_str}' 使用时钟周期度量，但文档未声明 ttp:tickRate"
                )));
            };
            (integer * scale + fraction) * 1000 / (ticks * scale)
        }
        other => {
            return Err(ConvertError::InvalidTime(format!(
                "时间戳 '{time_str}' 包含未知的时间度量 '{other}'"
            )));
        }
    };
    Ok(millis)
}

/// `(整数部分 * scale + 小数部分) * unit / scale`，全程向下取整。
const fn scaled_multiply(integer: u64, fraction: u64, scale: u64, unit: u64) -> u64 {
    integer * unit + fraction * unit / scale
}

/// 把 `number_str` 拆成 (整数部分, 小数部分, 小数部分的进位基数)。
fn parse_decimal_number(
    number_str: &str,
    original: &str,
) -> Result<(u64, u64, u64), ConvertError> {
    if number_str.is_empty() {
        return Err(ConvertError::InvalidTime(format!(
            "时间戳 '{original}' 缺少数字部分"
        )));
    }
    let (integer_str, fraction_str) = number_str
        .split_once('.')
        .unwrap_or((number_str, ""));
    if integer_str.is_empty() && fraction_str.is_empty() {
        return Err(ConvertError::InvalidTime(format!(
            "时间戳 '{original}' 的数字部分无效"
        )));
    }
    let integer = if integer_str.is_empty() {
        0
    } else {
        parse_component(integer_str, "整数", original)?
    };
    let truncated: String = fraction_str.chars().take(MAX_FRACTION_DIGITS).collect();
    if truncated.is_empty() {
        return Ok((integer, 0, 1));
    }
    let fraction = parse_component(&truncated, "小数", original)?;
    let scale = 10u64.pow(u32::try_from(truncated.len()).unwrap_or(1));
    Ok((integer, fraction, scale))
}

/// 解析 `SS` 或 `SS.frac`，返回秒与毫秒。
fn parse_seconds_with_fraction(
    seconds_str: &str,
    original: &str,
) -> Result<(u64, u64), ConvertError> {
    let (seconds_part, fraction_part) = seconds_str
        .split_once('.')
        .unwrap_or((seconds_str, ""));
    let seconds = parse_component(seconds_part, "秒", original)?;
    if fraction_part.is_empty() {
        return Ok((seconds, 0));
    }
    // 小数点后只采信毫秒精度，多余位数截断
    let truncated: String = fraction_part.chars().take(3).collect();
    let digits = parse_component(&truncated, "毫秒", original)?;
    let millis = digits * 10u64.pow(3 - u32::try_from(truncated.len()).unwrap_or(3));
    Ok((seconds, millis))
}

fn parse_component(part: &str, field: &str, original: &str) -> Result<u64, ConvertError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConvertError::InvalidTime(format!(
            "时间戳 '{original}' 的{field}部分 '{part}' 无效"
        )));
    }
    part.parse::<u64>().map_err(|e| {
        ConvertError::InvalidTime(format!(
            "无法解析时间戳 '{original}' 的{field}部分 '{part}': {e}"
        ))
    })
}

fn check_sexagesimal(value: u64, field: &str, original: &str) -> Result<(), ConvertError> {
    if value >= 60 {
        return Err(ConvertError::InvalidTime(format!(
            "{field}值 '{value}' (应 < 60) 在时间戳 '{original}' 中无效"
        )));
    }
    Ok(())
}

/// 从给定的属性名列表中获取第一个找到的属性，并将其转换为目标类型。
///
/// # 参数
/// * `e` - `BytesStart` 事件，代表一个 XML 标签的开始。
/// * `reader` - XML 读取器，用于解码。
/// * `attr_names` - 一个字节切片数组，包含所有要尝试的属性名（包括别名）。
/// * `processor` - 一个闭包，接收解码后的字符串值，并返回 `Result<T, ConvertError>`。
///
/// # 返回
/// * `Result<Option<T>, ConvertError>` - 成功时返回一个包含转换后值的 Option，如果找不到任何属性则返回 `None`。
pub(super) fn get_attribute_with_aliases<T, F>(
    e: &BytesStart,
    reader: &Reader<&[u8]>,
    attr_names: &[&[u8]],
    processor: F,
) -> Result<Option<T>, ConvertError>
where
    F: Fn(&str) -> Result<T, ConvertError>,
{
    let mut found_attr = None;
    for &name in attr_names {
        if let Some(attr) = e.try_get_attribute(name)? {
            found_attr = Some(attr);
            break;
        }
    }

    found_attr
        .map(|attr| {
            let decoded_value = attr.decode_and_unescape_value(reader.decoder())?;
            processor(&decoded_value)
        })
        .transpose()
}

/// 获取字符串类型的属性值。
pub(super) fn get_string_attribute(
    e: &BytesStart,
    reader: &Reader<&[u8]>,
    attr_names: &[&[u8]],
) -> Result<Option<String>, ConvertError> {
    get_attribute_with_aliases(e, reader, attr_names, |s| Ok(s.to_owned()))
}

/// 获取并解析为毫秒的时间表达式属性值。
///
/// 表达式无法解析时记录警告并返回 `None`，该属性被忽略。
pub(super) fn get_time_attribute(
    e: &BytesStart,
    reader: &Reader<&[u8]>,
    attr_names: &[&[u8]],
    frame_rate: Option<u32>,
    tick_rate: Option<u64>,
    warnings: &mut Vec<String>,
) -> Result<Option<u64>, ConvertError> {
    (get_string_attribute(e, reader, attr_names)?).map_or(Ok(None), |value_str| {
        match parse_time_expression(&value_str, frame_rate, tick_rate) {
            Ok(ms) => Ok(Some(ms)),
            Err(err) => {
                warnings.push(format!(
                    "时间戳 '{value_str}' 解析失败 ({err})。该时间戳将被忽略。"
                ));
                Ok(None)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock_expressions() {
        assert_eq!(
            parse_time_expression("01:02:03.456", None, None).unwrap(),
            3_723_456
        );
        assert_eq!(parse_time_expression("0:0:7", None, None).unwrap(), 7000);
        assert_eq!(
            parse_time_expression("00:00:05.5", None, None).unwrap(),
            5500
        );
        assert_eq!(
            parse_time_expression("99:59:59.999", None, None).unwrap(),
            359_999_999
        );
        // 帧形式需要帧率：12 帧 @ 25fps = 480ms
        assert_eq!(
            parse_time_expression("00:00:01:12", Some(25), None).unwrap(),
            1480
        );

        assert!(matches!(
            parse_time_expression("00:00:01:12", None, None),
            Err(ConvertError::InvalidTime(_))
        ));
        assert!(matches!(
            parse_time_expression("01:60:00.000", None, None),
            Err(ConvertError::InvalidTime(_))
        ));
        assert!(matches!(
            parse_time_expression("1:2", None, None),
            Err(ConvertError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_parse_offset_expressions() {
        assert_eq!(parse_time_expression("1.5h", None, None).unwrap(), 5_400_000);
        assert_eq!(parse_time_expression("2m", None, None).unwrap(), 120_000);
        assert_eq!(parse_time_expression("7.1s", None, None).unwrap(), 7100);
        assert_eq!(parse_time_expression("1500ms", None, None).unwrap(), 1500);
        assert_eq!(parse_time_expression("0.5s", None, None).unwrap(), 500);
        // 50 帧 @ 25fps = 2000ms
        assert_eq!(parse_time_expression("50f", Some(25), None).unwrap(), 2000);
        // 30 周期 @ 10000Hz = 3ms
        assert_eq!(
            parse_time_expression("30t", None, Some(10_000)).unwrap(),
            3
        );
        // 换算向下取整
        assert_eq!(parse_time_expression("1f", Some(30), None).unwrap(), 33);

        assert!(matches!(
            parse_time_expression("50f", None, None),
            Err(ConvertError::InvalidTime(_))
        ));
        assert!(matches!(
            parse_time_expression("30t", None, None),
            Err(ConvertError::InvalidTime(_))
        ));
        assert!(matches!(
            parse_time_expression("10x", None, None),
            Err(ConvertError::InvalidTime(_))
        ));
        assert!(matches!(
            parse_time_expression("10", None, None),
            Err(ConvertError::InvalidTime(_))
        ));
        assert!(matches!(
            parse_time_expression("", None, None),
            Err(ConvertError::InvalidTime(_))
        ));
    }
}
