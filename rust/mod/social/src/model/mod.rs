mod bookmark;
mod feed;
mod follow;
mod notification;
mod post;

pub use bookmark::*;
pub use feed::*;
pub use follow::*;
pub use notification::*;
pub use post::*;
