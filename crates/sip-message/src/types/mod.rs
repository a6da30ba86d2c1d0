//! Building blocks of a SIP message: byte views, header identities, header
//! values and the shared token table.

pub mod byte_view;
pub mod cseq;
pub mod header;
pub mod header_id;
pub mod name_addr;
pub mod param;
pub mod token_table;
pub mod via;

pub use byte_view::{java_hash, ByteView};
pub use cseq::CSeq;
pub use header::{Header, HeaderValue};
pub use header_id::{HeaderId, HeaderKind, HeaderName, HOT_SLOT_CAPACITY};
pub use name_addr::{NameAddr, SipUriParts};
pub use param::{Param, Params};
pub use token_table::{TokenCategory, MAGIC_COOKIE};
pub use via::Via;
