use super::error::{FieldError, HeaderError};
use super::fields::{FieldWalker, PpiField};
use super::reader::{PpiHeader, decode_header};

/// One decoded PPI layer, borrowing the capture buffer.
///
/// `contents` spans the header and TLV section, `payload` everything after
/// the declared length. When the TLV section is malformed, `fields` holds the
/// records decoded before the failure and `field_error` says why it stopped.
#[derive(Debug, Clone)]
pub struct PpiLayer<'a> {
    pub header: PpiHeader,
    pub fields: Vec<PpiField<'a>>,
    pub field_error: Option<FieldError>,
    pub contents: &'a [u8],
    pub payload: &'a [u8],
}

impl<'a> PpiLayer<'a> {
    /// Whether every TLV field was decoded.
    pub fn fields_complete(&self) -> bool {
        self.field_error.is_none()
    }

    /// Restart a walk over the TLV section from its first field.
    pub fn walk_fields(&self) -> FieldWalker<'a> {
        let region = self
            .contents
            .get(super::layout::FIXED_HEADER_LEN..)
            .unwrap_or_default();
        FieldWalker::new(region, self.header.is_aligned())
    }
}

/// Decode a PPI layer from the start of `buffer`.
///
/// Header failures abort the decode. TLV failures are kept on the layer.
///
/// # Examples
/// ```
/// use ppiscope_core::parse_ppi;
///
/// let frame = [0x00, 0x00, 0x08, 0x00, 0x69, 0x00, 0x00, 0x00, 0x08, 0x01];
/// let layer = parse_ppi(&frame)?;
/// assert_eq!(layer.header.dlt, 105);
/// assert!(layer.fields.is_empty());
/// assert_eq!(layer.payload, &[0x08, 0x01]);
/// # Ok::<(), ppiscope_core::HeaderError>(())
/// ```
pub fn parse_ppi(buffer: &[u8]) -> Result<PpiLayer<'_>, HeaderError> {
    let split = decode_header(buffer)?;

    let mut fields = Vec::new();
    let mut field_error = None;
    for result in FieldWalker::new(split.fields, split.header.is_aligned()) {
        match result {
            Ok(field) => fields.push(field),
            Err(err) => field_error = Some(err),
        }
    }

    Ok(PpiLayer {
        header: split.header,
        fields,
        field_error,
        contents: split.contents,
        payload: split.payload,
    })
}

#[cfg(test)]
mod tests {
    use super::parse_ppi;
    use crate::protocols::ppi::error::{FieldError, HeaderError};

    #[test]
    fn bare_header_splits_payload() {
        let frame = [0x00, 0x00, 0x08, 0x00, 0x01, 0x00, 0x00, 0x00, 0x10, 0x20, 0x30];
        let layer = parse_ppi(&frame).unwrap();
        assert_eq!(layer.contents.len(), 8);
        assert_eq!(layer.payload, &[0x10, 0x20, 0x30]);
        assert!(layer.fields.is_empty());
        assert!(layer.fields_complete());
    }

    #[test]
    fn header_errors_produce_no_layer() {
        assert!(matches!(
            parse_ppi(&[0x00, 0x00, 0x08]),
            Err(HeaderError::TooShort { .. })
        ));
        assert!(matches!(
            parse_ppi(&[0x00, 0x00, 0x04, 0x00, 0x01, 0x00, 0x00, 0x00]),
            Err(HeaderError::InvalidLength { .. })
        ));
        assert!(matches!(
            parse_ppi(&[0x00, 0x00, 0x20, 0x00, 0x01, 0x00, 0x00, 0x00]),
            Err(HeaderError::Truncated { .. })
        ));
    }

    #[test]
    fn overrunning_field_keeps_header_and_payload() {
        // Declared length 12 leaves room for a field header only; the field
        // claims two data bytes that sit past the TLV section.
        let frame = [
            0x00, 0x01, 0x0C, 0x00, 0x69, 0x00, 0x00, 0x00, 0x01, 0x00, 0x02, 0x00, 0xAA, 0xBB,
        ];
        let layer = parse_ppi(&frame).unwrap();
        assert_eq!(layer.header.version, 0);
        assert_eq!(layer.header.flags, 1);
        assert_eq!(layer.header.length, 12);
        assert_eq!(layer.header.dlt, 105);
        assert!(layer.fields.is_empty());
        assert_eq!(
            layer.field_error,
            Some(FieldError::FieldOverrun {
                offset: 8,
                field_type: 1,
                length: 2,
                remaining: 0,
            })
        );
        assert_eq!(layer.contents.len(), 12);
        assert_eq!(layer.payload, &[0xAA, 0xBB]);
    }

    #[test]
    fn aligned_field_accounts_for_declared_length() {
        let frame = [
            0x00, 0x01, 0x10, 0x00, 0x69, 0x00, 0x00, 0x00, 0x01, 0x00, 0x02, 0x00, 0xAA, 0xBB,
            0x00, 0x00, 0x80, 0x00,
        ];
        let layer = parse_ppi(&frame).unwrap();
        assert!(layer.fields_complete());
        assert_eq!(layer.fields.len(), 1);
        let field = layer.fields[0];
        assert_eq!((field.field_type, field.length), (1, 2));
        assert_eq!(field.data, &[0xAA, 0xBB]);
        assert_eq!(layer.payload, &[0x80, 0x00]);
    }

    #[test]
    fn partial_fields_survive_trailing_garbage() {
        let frame = [
            0x00, 0x00, 0x0F, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x7F, 0xFF,
            0xFF, 0x99,
        ];
        let layer = parse_ppi(&frame).unwrap();
        assert_eq!(layer.fields.len(), 1);
        assert_eq!(
            layer.field_error,
            Some(FieldError::IncompleteTrailingField {
                offset: 13,
                remaining: 2,
            })
        );
        assert_eq!(layer.payload, &[0x99]);
    }

    #[test]
    fn walk_fields_restarts_from_first_field() {
        let frame = [
            0x00, 0x00, 0x0D, 0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x00, 0x01, 0x00, 0x42,
        ];
        let layer = parse_ppi(&frame).unwrap();
        let first: Vec<_> = layer.walk_fields().collect();
        let second: Vec<_> = layer.walk_fields().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }
}
