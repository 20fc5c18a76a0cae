#![allow(dead_code)]

pub mod core;
pub mod error;
pub mod util;

pub use crate::core::config::Project;
pub use crate::core::discover::Include;
pub use crate::core::order::{CompileOrder, CompileStep, Role};
pub use crate::core::resolver::Outcome;
pub use crate::core::source::{IncludeMode, ResolveContext};
pub use crate::core::version::VhdlVersion;
pub use crate::error::{Diagnostic, DiagnosticList, Severity};
