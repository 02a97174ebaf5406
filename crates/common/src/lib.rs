pub mod claim;
pub mod entry;
pub mod error;
pub mod pagination;
pub mod principal;
pub mod profile;
pub mod testimonial;

pub use claim::{AtmCard, BankTransfer, CertifiedCheck, ClaimStatus, PayoutMethod, WinnerClaim};
pub use entry::{Activation, EntryView, WinningEntry};
pub use error::{Error, ErrorKind, Result};
pub use pagination::PageRequest;
pub use principal::{Caller, Principal};
pub use profile::{UserProfile, UserRole};
pub use testimonial::Testimonial;
