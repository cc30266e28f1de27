//! # Captions Core
//!
//! `stl_processor` 的核心类型：时间码、样式、字幕文档模型与错误定义。

pub mod document;
pub mod error;
pub mod style;
pub mod timecode;

pub use document::*;
pub use error::*;
pub use style::*;
pub use timecode::*;
