//! macOS Keychain adapter.
//!
//! Credentials are stored as internet-password items through the
//! `SecItem*` API of Security.framework. The item attributes carry the
//! identity: server, path, port, protocol, and the username as the account.
//!
//! Query semantics are the keychain's own. An attribute left out of a
//! query matches any stored value, so a port of 0 matches every port and
//! the `Generic` protocol matches every protocol. `get` returns the first
//! match. `delete` removes every match. `add` only ever replaces the item
//! stored under the exact same key.

use std::ffi::c_void;
use std::ptr;

use core_foundation::array::CFArray;
use core_foundation::base::{CFType, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::data::CFData;
use core_foundation::dictionary::CFDictionary;
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use core_foundation_sys::array::CFArrayGetTypeID;
use core_foundation_sys::base::{CFGetTypeID, CFTypeRef, OSStatus};
use core_foundation_sys::data::{CFDataGetTypeID, CFDataRef};
use core_foundation_sys::dictionary::{CFDictionaryGetTypeID, CFDictionaryGetValue, CFDictionaryRef};
use core_foundation_sys::number::{CFNumberGetTypeID, CFNumberRef};
use core_foundation_sys::string::{CFStringGetTypeID, CFStringRef};
use security_framework::item::{ItemClass, ItemSearchOptions, Limit, SearchResult};
use security_framework_sys::item::{
    kSecAttrAccount, kSecAttrAuthenticationType, kSecAttrLabel, kSecAttrPath, kSecAttrPort,
    kSecAttrProtocol, kSecAttrServer, kSecClass, kSecClassInternetPassword, kSecMatchLimit,
    kSecMatchLimitAll, kSecReturnAttributes, kSecReturnData, kSecReturnRef, kSecValueData,
    kSecValueRef,
};
use security_framework_sys::keychain_item::{SecItemAdd, SecItemCopyMatching, SecItemDelete};
use tracing::{debug, warn};

use keybridge_core::bridge::validate_add;
use keybridge_core::{
    BridgeError, Credential, KeychainBridge, Protocol, Result, ServerIdentity, StoredEntry,
};

const ERR_SEC_SUCCESS: OSStatus = 0;
const ERR_SEC_USER_CANCELED: OSStatus = -128;
const ERR_SEC_NOT_AVAILABLE: OSStatus = -25291;
const ERR_SEC_AUTH_FAILED: OSStatus = -25293;
const ERR_SEC_NO_SUCH_KEYCHAIN: OSStatus = -25294;
const ERR_SEC_DUPLICATE_ITEM: OSStatus = -25299;
const ERR_SEC_ITEM_NOT_FOUND: OSStatus = -25300;
const ERR_SEC_INTERACTION_NOT_ALLOWED: OSStatus = -25308;

// FourCC values of kSecAttrProtocolHTTPS / kSecAttrProtocolHTTP. "htps" is not a typo.
const PROTOCOL_HTTPS: &str = "htps";
const PROTOCOL_HTTP: &str = "http";
// kSecAttrAuthenticationTypeDefault. Older helpers query with it set.
const AUTH_TYPE_DEFAULT: &str = "dflt";

/// A `KeychainBridge` over the user's default keychain search list.
pub struct MacKeychain {
    label: String,
}

impl MacKeychain {
    /// `label` is attached to every item written, and `list` reports only
    /// items carrying it.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

fn key(constant: CFStringRef) -> CFString {
    unsafe { CFString::wrap_under_get_rule(constant) }
}

fn protocol_code(protocol: Protocol) -> Option<&'static str> {
    match protocol {
        Protocol::Generic => None,
        Protocol::Http => Some(PROTOCOL_HTTP),
        Protocol::Https => Some(PROTOCOL_HTTPS),
    }
}

fn protocol_from_code(code: Option<&str>) -> Protocol {
    match code {
        Some(PROTOCOL_HTTPS) => Protocol::Https,
        Some(PROTOCOL_HTTP) => Protocol::Http,
        _ => Protocol::Generic,
    }
}

/// Attributes that address an identity.
///
/// With `exact`, a port of 0 is still written into the query so items
/// stored under other ports are left alone. `Generic` never sets a
/// protocol attribute, so even an exact query matches every protocol;
/// [`clear_exact`] filters those out.
fn identity_attrs(identity: &ServerIdentity, exact: bool) -> Vec<(CFString, CFType)> {
    let mut attrs = vec![
        (
            key(unsafe { kSecClass }),
            key(unsafe { kSecClassInternetPassword }).as_CFType(),
        ),
        (
            key(unsafe { kSecAttrServer }),
            CFString::new(&identity.host).as_CFType(),
        ),
        (
            key(unsafe { kSecAttrPath }),
            CFString::new(&identity.path).as_CFType(),
        ),
    ];
    if identity.port != 0 || exact {
        attrs.push((
            key(unsafe { kSecAttrPort }),
            CFNumber::from(i32::from(identity.port)).as_CFType(),
        ));
    }
    if let Some(code) = protocol_code(identity.protocol) {
        attrs.push((
            key(unsafe { kSecAttrProtocol }),
            CFString::new(code).as_CFType(),
        ));
    }
    attrs
}

/// Translate an OSStatus into a bridge error.
fn status_error(status: OSStatus) -> BridgeError {
    let message = security_framework::base::Error::from_code(status).to_string();
    match status {
        ERR_SEC_ITEM_NOT_FOUND => BridgeError::NotFound,
        ERR_SEC_INTERACTION_NOT_ALLOWED => BridgeError::InteractionNotAllowed,
        ERR_SEC_AUTH_FAILED | ERR_SEC_USER_CANCELED => BridgeError::AccessDenied(message),
        ERR_SEC_NOT_AVAILABLE | ERR_SEC_NO_SUCH_KEYCHAIN => BridgeError::Unavailable(message),
        ERR_SEC_DUPLICATE_ITEM => BridgeError::Conflict(message),
        _ => BridgeError::Store(format!("{message} ({status})")),
    }
}

fn check(status: OSStatus) -> Result<()> {
    if status == ERR_SEC_SUCCESS {
        Ok(())
    } else {
        Err(status_error(status))
    }
}

fn delete_matching(attrs: &[(CFString, CFType)]) -> Result<()> {
    let query = CFDictionary::from_CFType_pairs(attrs);
    check(unsafe { SecItemDelete(query.as_concrete_TypeRef()) })
}

/// Run a `SecItemCopyMatching` query and take ownership of the result.
fn copy_matching(attrs: &[(CFString, CFType)]) -> Result<CFType> {
    let query = CFDictionary::from_CFType_pairs(attrs);
    let mut result: CFTypeRef = ptr::null();
    check(unsafe { SecItemCopyMatching(query.as_concrete_TypeRef(), &mut result) })?;
    if result.is_null() {
        return Err(BridgeError::NotFound);
    }
    Ok(unsafe { CFType::wrap_under_create_rule(result) })
}

/// Remove the item stored under exactly `identity`, if there is one.
///
/// Candidates come from the exact attribute query; the protocol is then
/// compared here so a `Generic` key never clears an `http`/`https` item
/// on the same host.
fn clear_exact(identity: &ServerIdentity) -> Result<()> {
    let mut attrs = identity_attrs(identity, true);
    attrs.push((
        key(unsafe { kSecMatchLimit }),
        key(unsafe { kSecMatchLimitAll }).as_CFType(),
    ));
    attrs.push((
        key(unsafe { kSecReturnAttributes }),
        CFBoolean::true_value().as_CFType(),
    ));
    attrs.push((
        key(unsafe { kSecReturnRef }),
        CFBoolean::true_value().as_CFType(),
    ));

    let result = match copy_matching(&attrs) {
        Ok(result) => result,
        Err(BridgeError::NotFound) => return Ok(()),
        Err(e) => return Err(e),
    };
    if unsafe { CFGetTypeID(result.as_CFTypeRef()) != CFArrayGetTypeID() } {
        return Err(BridgeError::Store("unexpected keychain result type".to_string()));
    }
    let items: CFArray<CFType> =
        unsafe { CFArray::wrap_under_get_rule(result.as_CFTypeRef() as _) };

    let wanted = protocol_code(identity.protocol);
    for item in items.iter() {
        let Some(attrs) = as_dictionary(item.as_CFTypeRef()) else {
            continue;
        };
        if attrs.string(unsafe { kSecAttrProtocol }).as_deref() != wanted {
            continue;
        }
        let Some(item_ref) = attrs.value(unsafe { kSecValueRef }) else {
            continue;
        };
        let query = [
            (
                key(unsafe { kSecClass }),
                key(unsafe { kSecClassInternetPassword }).as_CFType(),
            ),
            (key(unsafe { kSecValueRef }), unsafe {
                CFType::wrap_under_get_rule(item_ref)
            }),
        ];
        match delete_matching(&query) {
            Ok(()) | Err(BridgeError::NotFound) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Borrowed view of one attribute dictionary returned by the keychain.
struct ItemAttrs(CFDictionaryRef);

impl ItemAttrs {
    fn value(&self, attr: CFStringRef) -> Option<CFTypeRef> {
        let value = unsafe { CFDictionaryGetValue(self.0, attr as *const c_void) };
        if value.is_null() {
            None
        } else {
            Some(value)
        }
    }

    fn string(&self, attr: CFStringRef) -> Option<String> {
        let value = self.value(attr)?;
        if unsafe { CFGetTypeID(value) != CFStringGetTypeID() } {
            return None;
        }
        Some(unsafe { CFString::wrap_under_get_rule(value as CFStringRef) }.to_string())
    }

    fn data(&self, attr: CFStringRef) -> Option<Vec<u8>> {
        let value = self.value(attr)?;
        if unsafe { CFGetTypeID(value) != CFDataGetTypeID() } {
            return None;
        }
        Some(unsafe { CFData::wrap_under_get_rule(value as CFDataRef) }.bytes().to_vec())
    }

    fn number(&self, attr: CFStringRef) -> Option<i32> {
        let value = self.value(attr)?;
        if unsafe { CFGetTypeID(value) != CFNumberGetTypeID() } {
            return None;
        }
        unsafe { CFNumber::wrap_under_get_rule(value as CFNumberRef) }.to_i32()
    }

    fn identity(&self) -> Option<ServerIdentity> {
        let host = self.string(unsafe { kSecAttrServer })?;
        let protocol = protocol_from_code(self.string(unsafe { kSecAttrProtocol }).as_deref());
        let port = self
            .number(unsafe { kSecAttrPort })
            .and_then(|p| u16::try_from(p).ok())
            .unwrap_or(0);
        Some(ServerIdentity {
            protocol,
            host,
            path: self.string(unsafe { kSecAttrPath }).unwrap_or_default(),
            port,
        })
    }

    fn account(&self) -> String {
        self.string(unsafe { kSecAttrAccount }).unwrap_or_default()
    }
}

fn as_dictionary(item: CFTypeRef) -> Option<ItemAttrs> {
    if unsafe { CFGetTypeID(item) == CFDictionaryGetTypeID() } {
        Some(ItemAttrs(item as CFDictionaryRef))
    } else {
        None
    }
}

impl KeychainBridge for MacKeychain {
    fn name(&self) -> &'static str {
        "osxkeychain"
    }

    fn add(&self, identity: &ServerIdentity, credential: &Credential) -> Result<()> {
        validate_add(identity, credential)?;

        clear_exact(identity)?;

        let mut attrs = identity_attrs(identity, false);
        attrs.push((
            key(unsafe { kSecAttrAccount }),
            CFString::new(&credential.username_lossy()).as_CFType(),
        ));
        attrs.push((
            key(unsafe { kSecAttrLabel }),
            CFString::new(&self.label).as_CFType(),
        ));
        attrs.push((
            key(unsafe { kSecAttrAuthenticationType }),
            CFString::new(AUTH_TYPE_DEFAULT).as_CFType(),
        ));
        attrs.push((
            key(unsafe { kSecValueData }),
            CFData::from_buffer(credential.password().expose_secret()).as_CFType(),
        ));

        let attributes = CFDictionary::from_CFType_pairs(&attrs);
        check(unsafe { SecItemAdd(attributes.as_concrete_TypeRef(), ptr::null_mut()) })?;
        debug!(host = %identity.host, port = identity.port, "stored internet password");
        Ok(())
    }

    fn get(&self, identity: &ServerIdentity) -> Result<Credential> {
        identity.validate()?;

        let mut attrs = identity_attrs(identity, false);
        attrs.push((
            key(unsafe { kSecMatchLimit }),
            CFNumber::from(1i32).as_CFType(),
        ));
        attrs.push((
            key(unsafe { kSecReturnAttributes }),
            CFBoolean::true_value().as_CFType(),
        ));
        attrs.push((
            key(unsafe { kSecReturnData }),
            CFBoolean::true_value().as_CFType(),
        ));

        let result = copy_matching(&attrs)?;
        let item = as_dictionary(result.as_CFTypeRef()).ok_or_else(|| {
            BridgeError::Store("unexpected keychain result type".to_string())
        })?;
        let password = item.data(unsafe { kSecValueData }).ok_or(BridgeError::NotFound)?;
        let username = item.string(unsafe { kSecAttrAccount }).unwrap_or_default();

        Ok(Credential::new(username, password))
    }

    fn delete(&self, identity: &ServerIdentity) -> Result<()> {
        identity.validate()?;
        delete_matching(&identity_attrs(identity, false))?;
        debug!(host = %identity.host, port = identity.port, "deleted internet password");
        Ok(())
    }

    fn list(&self) -> Result<Vec<StoredEntry>> {
        let results = match ItemSearchOptions::new()
            .class(ItemClass::internet_password())
            .label(&self.label)
            .load_attributes(true)
            .limit(Limit::All)
            .search()
        {
            Ok(results) => results,
            Err(e) if e.code() == ERR_SEC_ITEM_NOT_FOUND => return Ok(Vec::new()),
            Err(e) => return Err(status_error(e.code())),
        };

        let mut entries = Vec::with_capacity(results.len());
        for result in &results {
            let SearchResult::Dict(dict) = result else {
                continue;
            };
            let attrs = ItemAttrs(dict.as_concrete_TypeRef());
            match attrs.identity() {
                Some(identity) => entries.push(StoredEntry {
                    identity,
                    username: attrs.account(),
                }),
                None => warn!("skipping keychain item without a server attribute"),
            }
        }
        Ok(entries)
    }
}
