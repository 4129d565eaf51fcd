pub mod admin;
pub mod deposit;
pub mod emergency;
pub mod harvest;
pub mod initialize;
pub mod mint;
pub mod recovery;
pub mod redeem;
pub mod sweep;
pub mod view;
pub mod withdraw;

#[allow(ambiguous_glob_reexports)]
pub use admin::*;
#[allow(ambiguous_glob_reexports)]
pub use deposit::*;
#[allow(ambiguous_glob_reexports)]
pub use emergency::*;
#[allow(ambiguous_glob_reexports)]
pub use harvest::*;
#[allow(ambiguous_glob_reexports)]
pub use initialize::*;
#[allow(ambiguous_glob_reexports)]
pub use mint::*;
#[allow(ambiguous_glob_reexports)]
pub use recovery::*;
#[allow(ambiguous_glob_reexports)]
pub use redeem::*;
#[allow(ambiguous_glob_reexports)]
pub use sweep::*;
#[allow(ambiguous_glob_reexports)]
pub use view::*;
#[allow(ambiguous_glob_reexports)]
pub use withdraw::*;
