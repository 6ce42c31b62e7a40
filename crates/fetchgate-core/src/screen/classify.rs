//! IP address categories for outbound screening.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Category of a resolved address. Anything other than `Public` is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressClass {
    Public,
    Private,
    Loopback,
    LinkLocal,
    Reserved,
    Multicast,
    Unspecified,
}

impl AddressClass {
    pub fn is_blocked(self) -> bool {
        self != AddressClass::Public
    }
}

/// Classifies `ip`. IPv4-mapped IPv6 addresses are classified as the
/// embedded IPv4 address.
pub fn classify(ip: IpAddr) -> AddressClass {
    match ip {
        IpAddr::V4(v4) => classify_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => classify_v4(v4),
            None => classify_v6(v6),
        },
    }
}

/// Shorthand for `classify(ip).is_blocked()`.
pub fn is_blocked(ip: IpAddr) -> bool {
    classify(ip).is_blocked()
}

fn classify_v4(v4: Ipv4Addr) -> AddressClass {
    let [a, b, c, _] = v4.octets();
    if v4.is_unspecified() {
        return AddressClass::Unspecified;
    }
    if v4.is_loopback() {
        return AddressClass::Loopback;
    }
    if v4.is_link_local() {
        return AddressClass::LinkLocal;
    }
    if v4.is_multicast() {
        return AddressClass::Multicast;
    }
    if v4.is_private() || (a == 100 && (64..=127).contains(&b)) {
        // 100.64.0.0/10 is carrier-grade NAT space.
        return AddressClass::Private;
    }
    if a == 0                                  // 0.0.0.0/8
        || a >= 240                            // 240.0.0.0/4 and broadcast
        || (a == 192 && b == 0 && c == 0)      // 192.0.0.0/24 protocol assignments
        || v4.is_documentation()               // TEST-NET-1/2/3
        || (a == 198 && (18..=19).contains(&b)) // 198.18.0.0/15 benchmarking
    {
        return AddressClass::Reserved;
    }
    AddressClass::Public
}

fn classify_v6(v6: Ipv6Addr) -> AddressClass {
    let s = v6.segments();
    if v6.is_unspecified() {
        return AddressClass::Unspecified;
    }
    if v6.is_loopback() {
        return AddressClass::Loopback;
    }
    if v6.is_multicast() {
        return AddressClass::Multicast;
    }
    if s[0] & 0xffc0 == 0xfe80 {
        return AddressClass::LinkLocal;
    }
    if s[0] & 0xfe00 == 0xfc00 || s[0] & 0xffc0 == 0xfec0 {
        // fc00::/7 unique local, fec0::/10 deprecated site-local
        return AddressClass::Private;
    }
    // 6to4 inherits the category of the embedded IPv4 address.
    if s[0] == 0x2002 {
        let embedded = Ipv4Addr::new((s[1] >> 8) as u8, s[1] as u8, (s[2] >> 8) as u8, s[2] as u8);
        return match classify_v4(embedded) {
            AddressClass::Public => AddressClass::Public,
            _ => AddressClass::Reserved,
        };
    }
    // Only 2000::/3 is allocated global unicast; carve out the special blocks in it.
    let global_unicast = s[0] & 0xe000 == 0x2000;
    let special = (s[0] == 0x2001 && s[1] < 0x0200) // 2001::/23 IETF protocol assignments
        || (s[0] == 0x2001 && s[1] == 0x0db8)        // 2001:db8::/32 documentation
        || (s[0] == 0x3fff && s[1] < 0x1000); // 3fff::/20 documentation
    if !global_unicast || special {
        return AddressClass::Reserved;
    }
    AddressClass::Public
}
