use std::{fmt, io};

use quick_xml::{
    Error as QuickXmlErrorMain, encoding::EncodingError,
    events::attributes::AttrError as QuickXmlAttrError,
};
use thiserror::Error;

/// 定义字幕转换和编码过程中可能发生的各种错误。
#[derive(Error, Debug)]
pub enum ConvertError {
    /// XML 解析错误，通常来自 `quick-xml` 库。
    #[error("解析 XML 错误: {0}")]
    Xml(#[from] QuickXmlErrorMain),
    /// XML 属性解析错误，通常来自 `quick-xml` 库。
    #[error("XML 属性错误: {0}")]
    Attribute(#[from] QuickXmlAttrError),
    /// 整数解析错误。
    #[error("解析错误: {0}")]
    ParseInt(#[from] std::num::ParseIntError),
    /// 无效的时间格式字符串。
    #[error("无效的时间格式: {0}")]
    InvalidTime(String),
    /// 字符串格式化错误。
    #[error("格式错误: {0}")]
    Format(#[from] fmt::Error),
    /// 内部逻辑错误或未明确分类的错误。
    #[error("错误: {0}")]
    Internal(String),
    /// 文件读写等IO错误。
    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),
    /// XML 文本编码或解码错误。
    #[error("文本编码或解码错误: {0}")]
    Encoding(#[from] EncodingError),
    /// 构建 GSI 头时，必填字段没有被赋值。
    #[error("GSI 字段 '{0}' 是必填字段，但从未被赋值")]
    MissingGsiField(&'static str),
    /// 赋给 GSI 字段的值的字节长度与字段声明的长度不一致。
    #[error("GSI 字段 '{name}' 长度不符: 声明 {expected} 字节, 实际 {actual} 字节")]
    GsiFieldLengthMismatch {
        /// 字段名。
        name: &'static str,
        /// 字段声明的字节长度。
        expected: usize,
        /// 实际赋值的字节长度。
        actual: usize,
    },
    /// 试图编码一个尚未构建完成的文档。
    #[error("文档尚未构建完成，无法编码为 STL")]
    DocumentNotBuilt,
    /// 时间码分量超出了 STL 单字节编码的范围。
    #[error("时间码分量 {component} 的值 {value} 超出 STL 可编码范围")]
    TimecodeOutOfRange {
        /// 超出范围的分量名（时/分/秒/帧）。
        component: &'static str,
        /// 实际的分量值。
        value: u64,
    },
}

impl From<ConvertError> for std::io::Error {
    fn from(err: ConvertError) -> Self {
        std::io::Error::other(err)
    }
}

impl ConvertError {
    /// 将任意可显示的解析错误包装为 `Internal` 错误。
    pub fn new_parse<E: fmt::Display>(err: E) -> Self {
        Self::Internal(format!("解析错误: {err}"))
    }
}
