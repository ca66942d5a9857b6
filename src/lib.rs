//! Compiles load-test templates and their data files into JMeter `.jmx`
//! test plans.
//!
//! ```no_run
//! use loadplan::{AuxiliaryFile, compile};
//!
//! let template = "[TestPlan: Smoke]\n\
//!                 [ThreadGroup: Users]\n\
//!                 [HttpRequest: Home]\n\
//!                 domain = example.com\n";
//! let files = [AuxiliaryFile::new("Users.csv", "uid\n42\n")];
//! let compilation = compile(template, &files)?;
//! println!("{}", compilation.document);
//! # Ok::<(), loadplan::CompileError>(())
//! ```
//!
//! Compilation is a pure function of its inputs: the same template and files
//! always produce the same document.

pub mod builder;
pub mod compiler;
pub mod config;
pub mod context;
pub mod error;

pub use builder::CompilerBuilder;
pub use compiler::{Compilation, Compiler, compile};
pub use config::CompilerConfig;
pub use error::{CompileError, ContextError, Phase};

pub use loadplan_datafiles::AuxiliaryFile;
pub use loadplan_types::{BodySource, GenerationContext, Warning};
