pub mod domain;
pub mod ports;

pub use domain::{
    avatar_url_for, AnalysisPayload, AnalysisResult, AnalysisStats, AuthSession, ChatMessage,
    ChatRole, Question, Technique, TextType, User, UserCredentials, UserRole,
};
pub use ports::{PortError, PortResult, StoreService, TextAnalysisService, TutorChatService};
