use tracing::{debug, trace};

use crate::common::domain::{is_valid_domain, trim_root};

use super::config::SrsConfig;
use super::types::AddressKind;
use super::{hash, parser, timestamp, SrsError};

/// SRS rewriter for one relay.
///
/// Stateless apart from its [`SrsConfig`]: every bit of history a bounce needs
/// travels inside the rewritten address and is protected by the keyed hash.
#[derive(Debug, Clone)]
pub struct Srs {
    config: SrsConfig,
}

impl Srs {
    pub fn new(config: SrsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SrsConfig {
        &self.config
    }

    /// Classify `address` as plain, SRS0 or SRS1.
    pub fn classify(&self, address: &str) -> Result<AddressKind, SrsError> {
        parser::validate(address).map(|parsed| parsed.kind)
    }

    /// Rewrite envelope sender `from` so bounces return via `relay_domain`.
    ///
    /// - plain `local@domain` becomes `SRS0=hash=ts=domain=local@relay`
    /// - `SRS0...@hop1` becomes `SRS1=hash=hop1==...@relay`
    /// - `SRS1=h=hop1=opaque@hopN` becomes `SRS1=hash=hop1=opaque@relay`, so
    ///   the address stays the same size however many hops it passes
    pub fn forward(&self, from: &str, relay_domain: &str) -> Result<String, SrsError> {
        self.forward_at(from, relay_domain, timestamp::current_epoch_secs())
    }

    /// [`forward`](Self::forward) with an explicit Unix time for the SRS0 timestamp.
    pub fn forward_at(
        &self,
        from: &str,
        relay_domain: &str,
        now_secs: u64,
    ) -> Result<String, SrsError> {
        let parsed = parser::validate(from)?;
        let relay = relay_domain.trim();
        let relay = trim_root(relay);
        if !is_valid_domain(relay) {
            debug!(relay = %relay_domain, "invalid relay domain");
            return Err(SrsError::InvalidAddress);
        }

        let sep = self.config.separator().as_char();
        let key = self.config.key();
        let len = self.config.hash_len();

        let rewritten = match parsed.kind {
            AddressKind::Srs1 => {
                let record = parser::split_srs1(&parsed.local_part)?;
                let hash = hash::generate(
                    &format!("{}{}", record.first_hop_domain, record.opaque),
                    key,
                    len,
                );
                format!(
                    "SRS1{sep}{hash}{sep}{}{sep}{}@{relay}",
                    record.first_hop_domain, record.opaque
                )
            }
            AddressKind::Srs0 => {
                let opaque = parser::strip_tag(&parsed.local_part)?;
                let hash = hash::generate(&format!("{}{}", parsed.domain, opaque), key, len);
                format!("SRS1{sep}{hash}{sep}{}{sep}{opaque}@{relay}", parsed.domain)
            }
            AddressKind::Plain => {
                let ts = timestamp::encode(now_secs);
                let hash = hash::generate(
                    &format!("{}{}{}", ts, parsed.domain, parsed.local_part),
                    key,
                    len,
                );
                format!(
                    "SRS0{sep}{hash}{sep}{ts}{sep}{}{sep}{}@{relay}",
                    parsed.domain, parsed.local_part
                )
            }
        };

        trace!(kind = ?parsed.kind, from = %from, to = %rewritten, "forward rewrite");
        Ok(rewritten)
    }

    /// Recover the address a bounce to `address` should be sent to.
    ///
    /// An SRS0 address yields the original sender. An SRS1 address yields the
    /// SRS0 address of the first hop, which reverses it in turn.
    pub fn reverse(&self, address: &str) -> Result<String, SrsError> {
        self.reverse_at(address, timestamp::current_epoch_secs())
    }

    /// [`reverse`](Self::reverse) with an explicit Unix time for the expiry check.
    pub fn reverse_at(&self, address: &str, now_secs: u64) -> Result<String, SrsError> {
        let parsed = parser::validate(address)?;
        let key = self.config.key();
        let len = self.config.hash_len();

        let original = match parsed.kind {
            AddressKind::Srs0 => {
                let record = parser::split_srs0_hashed(&parsed.local_part, len)?;
                let day = timestamp::decode(&record.timestamp)?;
                timestamp::check_validity_at(day, self.config.validity_days(), now_secs)
                    .inspect_err(|_| debug!(address = %address, "SRS0 timestamp expired"))?;
                hash::verify(
                    &record.hash,
                    &format!("{}{}{}", record.timestamp, record.domain, record.local_part),
                    key,
                    len,
                )
                .inspect_err(|_| debug!(address = %address, "SRS0 hash mismatch"))?;
                format!("{}@{}", record.local_part, record.domain)
            }
            AddressKind::Srs1 => {
                let record = parser::split_srs1_hashed(&parsed.local_part, len)?;
                hash::verify(
                    &record.hash,
                    &format!("{}{}", record.first_hop_domain, record.opaque),
                    key,
                    len,
                )
                .inspect_err(|_| debug!(address = %address, "SRS1 hash mismatch"))?;
                format!("SRS0{}@{}", record.opaque, record.first_hop_domain)
            }
            AddressKind::Plain => {
                debug!(address = %address, "reverse of non-SRS address");
                return Err(SrsError::InvalidSrsAddress);
            }
        };

        trace!(kind = ?parsed.kind, from = %address, to = %original, "reverse rewrite");
        Ok(original)
    }
}

impl From<SrsConfig> for Srs {
    fn from(config: SrsConfig) -> Self {
        Self::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srs::timestamp::PRECISION_SECS;
    use proptest::prelude::*;

    // 2026-10-16T12:00:00Z
    const NOW: u64 = 1_792_152_000;
    const DAY: u64 = PRECISION_SECS;

    fn srs(key: &str) -> Srs {
        Srs::new(SrsConfig::new(key))
    }

    fn local(address: &str) -> &str {
        address.split('@').next().unwrap()
    }

    // --- forward ---

    #[test]
    fn forward_plain_layout() {
        let out = srs("k").forward_at("bob@example.com", "relay.com", NOW).unwrap();
        let hash = hash::generate("IGexample.combob", b"k", 4);
        assert_eq!(out, format!("SRS0={}=IG=example.com=bob@relay.com", hash));
    }

    #[test]
    fn forward_plain_uses_wall_clock() {
        let out = srs("k").forward("bob@example.com", "relay.com").unwrap();
        let parts: Vec<&str> = out.split('=').collect();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0], "SRS0");
        assert_eq!(parts[1].len(), 4);
        assert_eq!(parts[2].len(), 2);
        assert_eq!(parts[3], "example.com");
        assert_eq!(parts[4], "bob@relay.com");
    }

    #[test]
    fn forward_srs0_to_srs1() {
        let s = srs("k");
        let srs0 = s.forward_at("bob@example.com", "1sthop.com", NOW).unwrap();
        let srs1 = s.forward_at(&srs0, "2ndhop.com", NOW).unwrap();

        let opaque = &local(&srs0)[4..];
        let hash = hash::generate(&format!("1sthop.com{}", opaque), b"k", 4);
        assert_eq!(srs1, format!("SRS1={}=1sthop.com={}@2ndhop.com", hash, opaque));
    }

    #[test]
    fn forward_srs1_refreshes_hash_only() {
        let srs0 = srs("k1").forward_at("bob@example.com", "1sthop.com", NOW).unwrap();
        let srs1 = srs("k2").forward_at(&srs0, "2ndhop.com", NOW).unwrap();
        let srs1b = srs("k3").forward_at(&srs1, "3rdhop.com", NOW).unwrap();

        let before = parser::split_srs1(local(&srs1)).unwrap();
        let after = parser::split_srs1(local(&srs1b)).unwrap();
        assert_eq!(after.first_hop_domain, before.first_hop_domain);
        assert_eq!(after.opaque, before.opaque);
        assert!(srs1b.ends_with("@3rdhop.com"));
        assert_eq!(srs1b.len(), srs1.len() + "3rdhop.com".len() - "2ndhop.com".len());

        let srs1c = srs("k4").forward_at(&srs1b, "4thhop.com", NOW).unwrap();
        assert_eq!(srs1c.len(), srs1b.len());
    }

    #[test]
    fn forward_with_custom_separator() {
        let s = Srs::new(SrsConfig::new("k").with_separator('+').unwrap());
        let srs0 = s.forward_at("bob@example.com", "1sthop.com", NOW).unwrap();
        assert!(srs0.starts_with("SRS0+"));
        assert_eq!(srs0.matches('+').count(), 4);

        let srs1 = srs("k2").forward_at(&srs0, "2ndhop.com", NOW).unwrap();
        assert!(srs1.starts_with("SRS1="));
        assert!(srs1.contains("=1sthop.com=+"));
    }

    #[test]
    fn forward_lowercase_srs0_tag_stripped_exactly() {
        let out = srs("k")
            .forward_at("srs0=SR0S=IG=example.com=bob@1sthop.com", "2ndhop.com", NOW)
            .unwrap();
        assert!(out.contains("=1sthop.com==SR0S=IG=example.com=bob@2ndhop.com"));
    }

    #[test]
    fn forward_hash_length() {
        let s = Srs::new(SrsConfig::new("k").with_hash_len(10).unwrap());
        let out = s.forward_at("bob@example.com", "relay.com", NOW).unwrap();
        assert_eq!(out.split('=').nth(1).unwrap().len(), 10);
    }

    #[test]
    fn forward_name_addr_and_root_dot() {
        let out = srs("k")
            .forward_at("Bob <bob@example.com>", "relay.com.", NOW)
            .unwrap();
        assert!(out.ends_with("=example.com=bob@relay.com"));
    }

    #[test]
    fn forward_rejects_invalid_input() {
        let s = srs("k");
        for (from, relay) in [
            ("not an address", "relay.com"),
            ("bob@example.com", ""),
            ("bob@example.com", "re lay.com"),
        ] {
            assert_eq!(s.forward_at(from, relay, NOW), Err(SrsError::InvalidAddress), "{}", relay);
        }
    }

    #[test]
    fn forward_rejects_short_srs1() {
        assert_eq!(
            srs("k").forward_at("SRS1=abcd=1sthop.com@2ndhop.com", "3rdhop.com", NOW),
            Err(SrsError::InvalidAddress)
        );
    }

    // --- reverse ---

    #[test]
    fn reverse_round_trip() {
        let s = srs("k");
        let out = s.forward("bob@example.com", "relay.com").unwrap();
        assert_eq!(s.reverse(&out).unwrap(), "bob@example.com");
    }

    #[test]
    fn reverse_round_trip_minus_separator_in_local() {
        let s = Srs::new(SrsConfig::new("k").with_separator('-').unwrap());
        let out = s.forward_at("bob-smith@example.com", "relay.com", NOW).unwrap();
        assert_eq!(s.reverse_at(&out, NOW).unwrap(), "bob-smith@example.com");
    }

    #[test]
    fn reverse_plus_separator_with_plus_in_hash() {
        let s = Srs::new(SrsConfig::new("k").with_separator('+').unwrap());
        let out = s.forward_at("user16@example.com", "relay.com", NOW).unwrap();
        assert_eq!(out, "SRS0+R+p8+IG+example.com+user16@relay.com");
        assert_eq!(s.reverse_at(&out, NOW).unwrap(), "user16@example.com");
    }

    #[test]
    fn reverse_srs1_plus_separator_with_plus_in_hash() {
        let srs0 = srs("k1").forward_at("user6@example.com", "1sthop.com", NOW).unwrap();
        assert_eq!(srs0, "SRS0=rt/R=IG=example.com=user6@1sthop.com");

        let hop2 = Srs::new(SrsConfig::new("k").with_separator('+').unwrap());
        let srs1 = hop2.forward_at(&srs0, "2ndhop.com", NOW).unwrap();
        assert_eq!(srs1, "SRS1+7sd++1sthop.com+=rt/R=IG=example.com=user6@2ndhop.com");
        assert_eq!(hop2.reverse_at(&srs1, NOW).unwrap(), srs0);
    }

    #[test]
    fn reverse_srs1_to_first_hop() {
        let hop1 = srs("key-one");
        let hop2 = srs("key-two");

        let srs0 = hop1.forward_at("bob@example.com", "1sthop.com", NOW).unwrap();
        let srs1 = hop2.forward_at(&srs0, "2ndhop.com", NOW).unwrap();

        let back = hop2.reverse_at(&srs1, NOW).unwrap();
        assert_eq!(back, srs0);
        assert_eq!(hop1.reverse_at(&back, NOW).unwrap(), "bob@example.com");
    }

    #[test]
    fn reverse_multi_hop_chain() {
        let hop1 = srs("key-one");
        let hop2 = srs("key-two");
        let hop3 = Srs::new(SrsConfig::new("key-three").with_separator('+').unwrap());

        let srs0 = hop1.forward_at("bob@example.com", "1sthop.com", NOW).unwrap();
        let srs1 = hop2.forward_at(&srs0, "2ndhop.com", NOW).unwrap();
        let srs1b = hop3.forward_at(&srs1, "3rdhop.com", NOW).unwrap();

        // Bounce hits hop 3, which hands it straight back to hop 1.
        let back = hop3.reverse_at(&srs1b, NOW).unwrap();
        assert_eq!(back, srs0);
        assert_eq!(hop1.classify(&back).unwrap(), AddressKind::Srs0);

        // Hop 2 also accepts its own SRS1, yielding the same address.
        assert_eq!(hop2.reverse_at(&srs1, NOW).unwrap(), srs0);

        assert_eq!(hop1.reverse_at(&back, NOW + 2 * DAY).unwrap(), "bob@example.com");
    }

    #[test]
    fn reverse_srs1_wrong_key() {
        let srs0 = srs("k1").forward_at("bob@example.com", "1sthop.com", NOW).unwrap();
        let srs1 = srs("k2").forward_at(&srs0, "2ndhop.com", NOW).unwrap();
        assert_eq!(srs("k3").reverse_at(&srs1, NOW), Err(SrsError::InvalidHash));
    }

    #[test]
    fn reverse_detects_hash_tampering() {
        let s = srs("k");
        let out = s.forward_at("bob@example.com", "relay.com", NOW).unwrap();
        let hash = out.split('=').nth(1).unwrap().to_string();

        for i in 0..hash.len() {
            let mut bytes = hash.clone().into_bytes();
            // Swap to a character that differs even case-insensitively.
            bytes[i] = if bytes[i].eq_ignore_ascii_case(&b'q') { b'7' } else { b'q' };
            let tampered_hash = String::from_utf8(bytes).unwrap();
            let tampered = out.replacen(&hash, &tampered_hash, 1);
            assert_eq!(s.reverse_at(&tampered, NOW), Err(SrsError::InvalidHash), "{}", tampered);
        }
    }

    #[test]
    fn reverse_detects_field_tampering() {
        let s = srs("k");
        let out = s.forward_at("bob@example.com", "relay.com", NOW).unwrap();
        let tampered = out.replace("=bob@", "=eve@");
        assert_eq!(s.reverse_at(&tampered, NOW), Err(SrsError::InvalidHash));
        let tampered = out.replace("=example.com=", "=example.org=");
        assert_eq!(s.reverse_at(&tampered, NOW), Err(SrsError::InvalidHash));
    }

    #[test]
    fn reverse_expiry_window() {
        let s = srs("k");
        let out = s.forward_at("bob@example.com", "relay.com", NOW).unwrap();
        assert_eq!(s.reverse_at(&out, NOW + 7 * DAY).unwrap(), "bob@example.com");
        assert_eq!(s.reverse_at(&out, NOW + 8 * DAY), Err(SrsError::TimestampExpired));
    }

    #[test]
    fn reverse_expiry_custom_window() {
        let s = Srs::new(SrsConfig::new("k").with_validity_days(30));
        let out = s.forward_at("bob@example.com", "relay.com", NOW).unwrap();
        assert_eq!(s.reverse_at(&out, NOW + 30 * DAY).unwrap(), "bob@example.com");
        assert_eq!(s.reverse_at(&out, NOW + 31 * DAY), Err(SrsError::TimestampExpired));
    }

    #[test]
    fn reverse_across_timestamp_wrap() {
        let s = srs("k");
        // Day 1023 of a 1024-day period.
        let generated = (20 * 1024 + 1023) * DAY;
        let out = s.forward_at("bob@example.com", "relay.com", generated).unwrap();
        assert!(out.contains("=77="));
        assert_eq!(s.reverse_at(&out, generated + 3 * DAY).unwrap(), "bob@example.com");
    }

    #[test]
    fn reverse_bad_timestamp_character() {
        let s = srs("k");
        let out = s.forward_at("bob@example.com", "relay.com", NOW).unwrap();
        let tampered = out.replacen("=IG=", "=I1=", 1);
        assert_eq!(s.reverse_at(&tampered, NOW), Err(SrsError::InvalidTimestampCharacter));
    }

    #[test]
    fn reverse_case_insensitive() {
        let s = srs("k");
        let out = s.forward_at("bob@example.com", "relay.com", NOW).unwrap();
        let lower = out.to_ascii_lowercase();
        let upper = out.to_ascii_uppercase();
        assert_eq!(s.reverse_at(&lower, NOW).unwrap(), "bob@example.com");
        assert_eq!(s.reverse_at(&upper, NOW).unwrap(), "BOB@EXAMPLE.COM");

        let mixed = out.replacen("SRS0", "sRs0", 1);
        assert_eq!(s.reverse_at(&mixed, NOW).unwrap(), "bob@example.com");
    }

    #[test]
    fn reverse_srs1_case_insensitive() {
        let srs0 = srs("k1").forward_at("bob@example.com", "1sthop.com", NOW).unwrap();
        let hop2 = srs("k2");
        let srs1 = hop2.forward_at(&srs0, "2ndhop.com", NOW).unwrap();
        let lower = srs1.to_ascii_lowercase();
        let back = hop2.reverse_at(&lower, NOW).unwrap();
        assert_eq!(back.to_ascii_lowercase(), srs0.to_ascii_lowercase());
    }

    #[test]
    fn reverse_reference_address_with_other_key() {
        // Counter reads "NP" on day 432 of the period.
        let now = (20 * 1024 + 432) * DAY;
        assert_eq!(
            srs("SekretKey2").reverse_at("srs0=ua6a=np=example.com=bob@1sthop.com", now),
            Err(SrsError::InvalidHash)
        );
    }

    #[test]
    fn reverse_reference_address() {
        let now = (20 * 1024 + 432) * DAY;
        assert_eq!(
            srs("Sekretkey")
                .reverse_at("srs0=ua6a=np=example.com=bob@1sthop.com", now)
                .unwrap(),
            "bob@example.com"
        );
    }

    #[test]
    fn reverse_plain_address() {
        assert_eq!(srs("k").reverse("bob@example.com"), Err(SrsError::InvalidSrsAddress));
        assert_eq!(srs("k").reverse("SRS2=x@example.com"), Err(SrsError::InvalidSrsAddress));
    }

    #[test]
    fn reverse_malformed() {
        let s = srs("k");
        assert_eq!(s.reverse("garbage"), Err(SrsError::InvalidAddress));
        assert_eq!(s.reverse("SRS0=abcd=IG@relay.com"), Err(SrsError::InvalidAddress));
        assert_eq!(s.reverse("SRS1=abcd@relay.com"), Err(SrsError::InvalidAddress));
    }

    #[test]
    fn classify_addresses() {
        let s = srs("k");
        assert_eq!(s.classify("bob@example.com"), Ok(AddressKind::Plain));
        assert_eq!(s.classify("SRS0=a=b=c=d@e.com"), Ok(AddressKind::Srs0));
        assert_eq!(s.classify("srs1=a=b=c@e.com"), Ok(AddressKind::Srs1));
        assert_eq!(s.classify("nope"), Err(SrsError::InvalidAddress));
    }

    #[test]
    fn srs_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Srs>();
    }

    proptest! {
        #[test]
        fn forward_reverse_round_trip(
            local in "[a-z0-9][a-z0-9._+-]{0,20}[a-z0-9]",
            domain in "[a-z0-9]{1,10}\\.(com|org|net)",
            relay in "[a-z0-9]{1,10}\\.(com|org|net)",
            sep in prop::sample::select(vec!['=', '+', '-']),
            days in 0u64..=7,
        ) {
            prop_assume!(!local.contains(".."));
            prop_assume!(parser::classify(&local) == AddressKind::Plain);
            let s = Srs::new(SrsConfig::new("prop-key").with_separator(sep).unwrap());
            let original = format!("{}@{}", local, domain);
            let rewritten = s.forward_at(&original, &relay, NOW).unwrap();
            prop_assert_eq!(s.reverse_at(&rewritten, NOW + days * DAY).unwrap(), original);
        }
    }
}
