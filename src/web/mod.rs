// Web 模块 - 表单页面与 JSON 接口
pub mod chart;
pub mod form;
pub mod render;
pub mod server;

pub use server::{router, serve, AppState};
