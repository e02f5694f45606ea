// service/src/models/mod.rs

//! Persistent records owned by the order store.

pub mod interaction;
pub mod order;

pub use interaction::{InteractionDirection, VendorInteraction};
pub use order::{
  ApprovalStatus, BindingType, EventSource, FulfillmentStatus, NewPrintOrder, ParentOrderView, PaymentStatus,
  PostalAddress, PrintOrder, PrintableAssets, ProcessLogEntry, ShippingDetails, StatusHistoryEntry, TrackingInfo,
};
