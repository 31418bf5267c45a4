pub mod api;
pub mod onboarding;
pub mod session;
pub mod storage;

pub use api::{ApiClient, ChatSession, ChatTurn, ClientError};
pub use onboarding::{Field, Step, Wizard, WizardError, WizardState};
pub use session::{ChatMessage, Sender, SessionCache};
pub use storage::{FileStorage, LocalStorage, MemoryStorage, SharedStorage};
