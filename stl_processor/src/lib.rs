//! # STL Processor: TTML 字幕到 EBU STL 的转换引擎
//!
//! 该 crate 把 W3C TTML 计时文本字幕文件转换为 EBU Tech 3264 STL
//! 二进制字幕交换格式（25fps / Latin / 电传文本档），供广播与
//! 母带制作管线使用。
//!
//! 两个主要入口：
//! - [`parse_ttml`]：把 TTML 字符串解析为 [`captions_core::TimedTextDocument`]，
//!   同时应用调用方给定的显示时间窗口与时间轴偏移。
//! - [`generate_stl`]：把已构建的文档编码为完整的 STL 字节流
//!   （1024 字节 GSI 头 + N × 128 字节 TTI 块）。
//!
//! ## ⚠️ 注意：不是通用的 TTML 排版引擎
//!
//! 解析器只落实字幕转换所需的语义：可继承的计时、单跳样式引用与
//! 基线布局。`region` 的绝对定位等排版特性不在范围内。
//! 同样，STL 侧只支持编码，不支持读取。
//!
//! ## Examples
//!
//! ```rust
//! use stl_processor::{
//!     ParseSession, StlGenerationOptions, TtmlParseOptions, generate_stl, parse_ttml,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ttml = r#"
//!     <tt xmlns="http://www.w3.org/ns/ttml" xml:lang="en">
//!       <body>
//!         <div>
//!           <p begin="1s" end="3s">Hello world</p>
//!         </div>
//!       </body>
//!     </tt>
//!     "#;
//!
//!     let mut session = ParseSession::new();
//!     let document = parse_ttml(ttml, &TtmlParseOptions::default(), &mut session)?;
//!     assert_eq!(document.captions.len(), 1);
//!
//!     let stl = generate_stl(&document, &StlGenerationOptions::default())?;
//!     // 一个 GSI 头加一个 TTI 块
//!     assert_eq!(stl.len(), 1024 + 128);
//!     assert_eq!(&stl[0..3], b"850");
//!     Ok(())
//! }
//! ```

pub mod generator;
pub mod parser;

pub use generator::{STL_FRAME_RATE, StlGenerationOptions, generate_stl};
pub use parser::{ParseSession, TtmlParseOptions, parse_ttml};
