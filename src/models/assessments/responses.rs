use serde::Serialize;

// 评估者的互评进度
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PeerProgressResponse {
    pub finished: bool,
    pub completed: u32,
}
