mod behaviour;
mod error;
mod function;

pub use behaviour::{
    Behaviour, Declaration, DeclaresBehaviours, InlineContext, LockedContext, SerialContext,
    finalize, try_finalize,
};
pub use error::CallError;
pub use function::FunctionContract;
