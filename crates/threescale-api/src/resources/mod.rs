// Typed resource handles
//
// Each handle is a newtype over `Resource` that pins the resource kind at
// compile time, derefs to the generic handle, and adds the verbs and child
// managers specific to that kind.

use std::ops::Deref;

use crate::kind::ResourceKind;
use crate::resource::Resource;

/// A typed handle bound to one [`ResourceKind`].
pub trait Kind: From<Resource> + Into<Resource> + Deref<Target = Resource> {
    const KIND: ResourceKind;
}

/// Kinds whose managers need no ancestor ids.
pub trait RootKind: Kind {}

/// Declare a typed handle for one resource kind.
macro_rules! typed_resource {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name($crate::resource::Resource);

        impl From<$crate::resource::Resource> for $name {
            fn from(resource: $crate::resource::Resource) -> Self {
                Self(resource)
            }
        }

        impl From<$name> for $crate::resource::Resource {
            fn from(handle: $name) -> Self {
                handle.0
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = $crate::resource::Resource;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl ::std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl $crate::resources::Kind for $name {
            const KIND: $crate::kind::ResourceKind = $crate::kind::ResourceKind::$kind;
        }

        impl $name {
            /// Send the cached attributes back and return the updated handle.
            pub fn update(&self) -> Result<Self, $crate::error::Error> {
                self.0.update().map(Self)
            }
        }
    };
    ($(#[$meta:meta])* $name:ident => $kind:ident, root) => {
        typed_resource!($(#[$meta])* $name => $kind);

        impl $crate::resources::RootKind for $name {}
    };
}

pub mod account;
pub mod application;
pub mod metric;
pub mod plans;
pub mod portal;
pub mod proxy;
pub mod service;

pub use account::{Account, AccountUser, Provider};
pub use application::{Application, ApplicationKey};
pub use metric::{Method, Metric};
pub use plans::{AccountPlan, ApplicationPlan, ApplicationPlanLimit, ServicePlan};
pub use portal::{ActiveDoc, Settings, Webhook};
pub use proxy::{MappingRule, Proxy};
pub use service::Service;
