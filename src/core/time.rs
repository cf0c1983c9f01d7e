use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Current UTC time at microsecond precision, the resolution Postgres `TIMESTAMP` keeps.
pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    let now = now.replace_microsecond(now.microsecond()).unwrap_or(now);
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn to_primitive_utc(value: OffsetDateTime) -> PrimitiveDateTime {
    let utc = value.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

pub(crate) fn format_optional(value: Option<PrimitiveDateTime>) -> Option<String> {
    value.map(format_primitive)
}

/// Wall-clock time at `offset` converted to a UTC instant.
pub(crate) fn local_to_utc(value: PrimitiveDateTime, offset: UtcOffset) -> PrimitiveDateTime {
    to_primitive_utc(value.assume_offset(offset))
}

/// UTC instant rendered as wall-clock time at `offset`.
pub(crate) fn utc_to_local(value: PrimitiveDateTime, offset: UtcOffset) -> PrimitiveDateTime {
    let local = value.assume_utc().to_offset(offset);
    PrimitiveDateTime::new(local.date(), local.time())
}
