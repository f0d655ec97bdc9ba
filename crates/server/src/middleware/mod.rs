mod model_loaders;

pub use model_loaders::{HandleAccount, load_account_middleware, load_task_middleware};
