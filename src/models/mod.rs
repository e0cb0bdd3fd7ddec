//! 数据模型

pub mod openai;
