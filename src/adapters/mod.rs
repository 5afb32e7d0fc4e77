// 外部系統的具體實作：文字生成服務、PDF 後端、本機儲存、HTTP 介面

#[cfg(feature = "server")]
pub mod http;
pub mod openai;
pub mod pdf;
pub mod storage;
