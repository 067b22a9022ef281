//! Per-certificate classification.
//!
//! Turns one DER certificate into a [`CertificateRecord`]: flattened and
//! structured names, validity window, CA and self-signed flags, SANs and
//! system trust anchor membership. Everything here is pure; no I/O.

use chrono::{DateTime, Utc};
use log::debug;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::time::ASN1Time;
use x509_parser::x509::{AttributeTypeAndValue, X509Name};

use crate::config::OID_BASIC_CONSTRAINTS;
use crate::error_handling::ClassifyError;
use crate::models::{CertificateRecord, NameFields, TrustAnchorSet};

/// Classifies a DER certificate against the trust anchors.
///
/// The returned record has an empty `observed_hostnames` set and an
/// `occurrence_count` of 1; the fetcher attaches the hostname.
///
/// # Errors
///
/// Returns `ClassifyError` if the DER does not parse as an X.509 certificate.
pub fn classify(der: &[u8], anchors: &TrustAnchorSet) -> Result<CertificateRecord, ClassifyError> {
    let (_, cert) = x509_parser::parse_x509_certificate(der)
        .map_err(|e| ClassifyError(e.to_string()))?;

    let subject_fields = extract_name_fields(cert.subject());
    let issuer_fields = extract_name_fields(cert.issuer());
    let subject_alt_names = extract_dns_sans(&cert);

    // A trust-store entry that carries SANs is reported like a leaf or intermediate
    let is_system_trust_anchor = anchors.contains(der) && subject_alt_names.is_empty();

    Ok(CertificateRecord {
        subject: subject_fields.flatten(),
        subject_fields,
        issuer: issuer_fields.flatten(),
        issuer_fields,
        valid_from: to_datetime(&cert.validity().not_before),
        valid_until: to_datetime(&cert.validity().not_after),
        is_ca: is_ca(&cert),
        is_self_signed: is_self_signed(&cert),
        is_system_trust_anchor,
        subject_alt_names,
        occurrence_count: 1,
        der: der.to_vec(),
        ..Default::default()
    })
}

/// Reads the `cA` flag of the basic constraints extension.
///
/// Absent or malformed extensions count as "not a CA".
pub fn is_ca(cert: &X509Certificate<'_>) -> bool {
    cert.extensions()
        .iter()
        .filter(|ext| ext.oid.to_id_string() == OID_BASIC_CONSTRAINTS)
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::BasicConstraints(bc) => Some(bc.ca),
            _ => None,
        })
        .unwrap_or(false)
}

/// Issuer equals subject and the signature verifies with the certificate's own key.
pub fn is_self_signed(cert: &X509Certificate<'_>) -> bool {
    cert.subject().as_raw() == cert.issuer().as_raw() && cert.verify_signature(None).is_ok()
}

/// Collects the attributes of a distinguished name into [`NameFields`].
///
/// Matching is by attribute OID. Repeated attributes are joined with a space.
/// BMP and universal strings are decoded from UTF-16 and UTF-32; any other
/// value that is not a string type is decoded lossily as UTF-8.
pub fn extract_name_fields(name: &X509Name<'_>) -> NameFields {
    let mut fields = NameFields::default();

    for attr in name.iter_attributes() {
        let value = attribute_value(attr);
        let slot = match attr.attr_type().to_id_string().as_str() {
            "2.5.4.6" => &mut fields.country,
            "2.5.4.8" => &mut fields.state,
            "2.5.4.7" => &mut fields.locality,
            "2.5.4.10" => &mut fields.organization,
            "2.5.4.11" => &mut fields.organizational_unit,
            "2.5.4.3" => &mut fields.common_name,
            "2.5.4.46" => &mut fields.distinguished_name_qualifier,
            "1.2.840.113549.1.9.1" => &mut fields.email,
            "2.5.4.5" => &mut fields.serial,
            _ => continue,
        };
        if !slot.is_empty() {
            slot.push(' ');
        }
        slot.push_str(&value);
    }

    fields
}

const TAG_UNIVERSAL_STRING: u32 = 28;
const TAG_BMP_STRING: u32 = 30;

fn attribute_value(attr: &AttributeTypeAndValue<'_>) -> String {
    if let Ok(value) = attr.as_str() {
        return value.to_string();
    }

    let any = attr.attr_value();
    let bytes = any.as_bytes();
    let decoded = match any.tag().0 {
        TAG_BMP_STRING => decode_utf16_be(bytes),
        TAG_UNIVERSAL_STRING => decode_utf32_be(bytes),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };
    debug!(
        "Decoded attribute {} with tag {} as {decoded:?}",
        attr.attr_type().to_id_string(),
        any.tag().0
    );
    decoded
}

fn decode_utf16_be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

fn decode_utf32_be(bytes: &[u8]) -> String {
    bytes
        .chunks_exact(4)
        .map(|quad| {
            char::from_u32(u32::from_be_bytes([quad[0], quad[1], quad[2], quad[3]]))
                .unwrap_or(char::REPLACEMENT_CHARACTER)
        })
        .collect()
}

/// DNS names from the Subject Alternative Name extension, in certificate order,
/// without duplicates.
pub fn extract_dns_sans(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut sans: Vec<String> = Vec::new();

    for ext in cert.extensions() {
        if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
            for general_name in &san.general_names {
                if let GeneralName::DNSName(dns_name) = general_name {
                    if !sans.iter().any(|s| s.as_str() == *dns_name) {
                        sans.push(dns_name.to_string());
                    }
                }
            }
        }
    }

    sans
}

fn to_datetime(time: &ASN1Time) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0)
}
