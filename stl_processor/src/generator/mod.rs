//! # EBU STL 字幕生成器
//!
//! 把已构建的 [`TimedTextDocument`] 编码为完整的 STL 字节流：
//! 一个 1024 字节的 GSI 头，后接 N 个 128 字节的 TTI 块。
//! 输出按 25fps / Latin / 电传文本档规格生成。

pub mod gsi;
pub mod tti;

use captions_core::{ConvertError, TimedTextDocument};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// STL 输出使用的固定帧率。
pub const STL_FRAME_RATE: u32 = 25;

/// STL 生成选项。
#[derive(Debug, Clone, Default)]
pub struct StlGenerationOptions {
    /// 写入 GSI `CD`/`RD` 字段的创建日期。`None` 时取当天。
    pub creation_date: Option<NaiveDate>,
    /// 覆盖 GSI `LC` 字段的 EBU 语言代码（2 字节）。
    /// `None` 时由文档语言推导，推导失败时写入 "00"。
    pub language_code: Option<String>,
}

/// STL 生成的主入口函数。
///
/// # 参数
///
/// * `document` - 已构建完成的字幕文档。
/// * `options` - 生成选项。
///
/// # 返回
///
/// * `Ok(Vec<u8>)` - 完整的 STL 文件字节流（GSI 头 + TTI 块流）。
///
/// # Errors
///
/// * `ConvertError::DocumentNotBuilt` - 文档的构建标记未置位。
/// * `ConvertError::MissingGsiField` / `GsiFieldLengthMismatch` -
///   GSI 头无法按字段表构建。
/// * `ConvertError::TimecodeOutOfRange` - 某条字幕的时间码分量
///   超出单字节可编码范围。
pub fn generate_stl(
    document: &TimedTextDocument,
    options: &StlGenerationOptions,
) -> Result<Vec<u8>, ConvertError> {
    if !document.is_built() {
        return Err(ConvertError::DocumentNotBuilt);
    }

    let plans = tti::plan_blocks(document, gsi::MAX_ROWS);
    let tti_stream = tti::serialize_blocks(&plans, STL_FRAME_RATE)?;
    let total_blocks: usize = plans.iter().map(|plan| plan.chunks.len()).sum();
    debug!(
        "编码了 {} 条字幕，共 {} 个 TTI 块",
        plans.len(),
        total_blocks
    );

    let mut builder = gsi::GsiBuilder::new();
    let language_code = options.language_code.clone().unwrap_or_else(|| {
        document
            .language
            .as_deref()
            .and_then(gsi::language_code)
            .map_or_else(
                || {
                    warn!(
                        "文档语言 {:?} 没有对应的 EBU 语言代码，LC 写入 \"00\"",
                        document.language
                    );
                    "00".to_string()
                },
                str::to_string,
            )
    });
    builder.assign("LC", language_code.into_bytes());

    let programme_title = document
        .title
        .as_deref()
        .or(document.filename.as_deref())
        .unwrap_or("");
    builder.assign("OPT", gsi::pad_field(programme_title, 32));
    if let Some(description) = &document.description {
        builder.assign("OET", gsi::pad_field(description, 32));
    }
    if let Some(author) = &document.author {
        builder.assign("TN", gsi::pad_field(author, 32));
    }
    if let Some(title) = &document.title {
        builder.assign("TCD", gsi::pad_field(title, 32));
    }
    if let Some(copyright) = &document.copyright {
        builder.assign("PUB", gsi::pad_field(copyright, 32));
    }

    let computed = gsi::GsiComputedValues {
        creation_date: options
            .creation_date
            .unwrap_or_else(|| chrono::Local::now().date_naive()),
        total_blocks,
        total_subtitles: plans.len(),
        first_cue: plans.first().map(|plan| plan.begin),
    };
    let header = builder.build(&computed)?;

    let mut stream = Vec::with_capacity(header.len() + tti_stream.len());
    stream.extend_from_slice(&header);
    stream.extend_from_slice(&tti_stream);
    Ok(stream)
}
