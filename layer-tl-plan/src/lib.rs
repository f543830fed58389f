//! Compiles parsed TL schemas into wire plans.
//!
//! The pipeline runs once per build over immutable input, each stage
//! producing the next stage's input:
//!
//! 1. [`build_type_tree`] groups constructors by result type, in schema order.
//! 2. [`resolve`] turns every group into a singleton, an enum or an interface.
//! 3. [`plan`] lays out each declaration: field order, presence bits, size.
//! 4. [`build_dispatch`] maps every identifier to its plan and rejects collisions.
//!
//! [`compile`] runs all four over any number of merged schemas and returns a
//! [`PlanSet`]. The [`codec`] module interprets a plan set at run time.
//!
//! ```rust
//! use layer_tl_parser::{Schema, SchemaConfig};
//! use layer_tl_plan::{Config, ResolvedType, compile};
//!
//! let src = "\
//! inputPeerEmpty#7f3b18ea = InputPeer;
//! inputPeerSelf#7da07ec9 = InputPeer;
//! ";
//! let schema = Schema::from_tl_str(src, SchemaConfig::default()).unwrap();
//! let plans = compile(&[schema], &Config::default()).unwrap();
//! assert!(matches!(plans.types[0].resolved, ResolvedType::Enum { .. }));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
mod config;
mod dispatch;
/// Plan and codec errors.
pub mod errors;
mod layout;
mod metadata;
pub mod names;
mod plan;
mod resolve;
mod tree;

pub use codec::Codec;
pub use config::{Capabilities, Config, PatternRule};
pub use dispatch::{DispatchEntry, DispatchTable, build_dispatch};
pub use errors::{CodecError, PlanError};
pub use layout::{FieldKind, FieldPlan, ID_SIZE, PresenceBit, Probe, ProbeKind, SizeFormula, WirePlan, plan};
pub use plan::{DeclarationPlan, PlanSet, Role, SchemaSummary, TypePlan, compile};
pub use resolve::{CommonField, EnumMember, Member, ResolvedType, resolve, resolve_group};
pub use tree::{TypeKey, TypeTree, build_type_tree};
