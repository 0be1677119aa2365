//! Sylva VM core
//!
//! The runtime object and type model of a loaded program:
//! - Name interning and the type table (`names`, `types`)
//! - GC header word, object heap, and root registration (`gc`)
//! - Collection flavors (`flavor`)
//! - Global constant buffer, literals, and computed constants
//!   (`globals`, `string`, `literal`, `constant`)
//! - Regex and validator table (`regex_table`)
//! - Callable declarations (`invoke`)
//! - Assembly loading (`assembly`)
//! - Runtime trap taxonomy (`trap`)

pub mod assembly;
pub mod constant;
pub mod defaults;
pub mod flavor;
pub mod gc;
pub mod globals;
pub mod invoke;
pub mod literal;
pub mod names;
pub mod regex_table;
pub mod string;
pub mod trap;
pub mod types;

pub use assembly::{AssemblyDocument, AssemblyLoader, LoadError, LoadedProgram, LoaderConfig};
pub use constant::{DeferredInitializer, Initializer, NoInitializer, PendingConstant};
pub use flavor::{FlavorRegistry, ListFlavor, MapFlavor};
pub use gc::{HeaderWord, Heap, ObjectRef};
pub use globals::GlobalStore;
pub use invoke::{InvokeDecl, InvokeTable};
pub use literal::LiteralValue;
pub use names::{NameRegistry, Namespace};
pub use regex_table::RegexTable;
pub use string::StringSlot;
pub use trap::{SourceLocation, Trap, TrapKind};
pub use types::{LayoutKind, RefMask, TypeDescriptor, TypeId, TypeKind, TypeTable};
