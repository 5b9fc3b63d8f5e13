use super::error::BencodeError;
use super::value::Value;
use std::io::Write;

/// Encodes a value into its canonical bencode form.
///
/// Dictionary entries are written in sorted key order, so for any value
/// `decode(&encode(&v)?) == v`, and for canonical input bytes
/// `encode(&decode(bytes)?)? == bytes`.
///
/// # Examples
///
/// ```
/// use bitwire::bencode::{encode, Value};
///
/// assert_eq!(encode(&Value::Integer(42)).unwrap(), b"i42e");
/// assert_eq!(encode(&Value::string("spam")).unwrap(), b"4:spam");
/// ```
pub fn encode(value: &Value) -> Result<Vec<u8>, BencodeError> {
    let mut buf = Vec::new();
    encode_to(value, &mut buf)?;
    Ok(buf)
}

/// Encodes a value into an arbitrary writer.
///
/// This is how info-hashes are computed without materializing the encoded
/// bytes: the writer can be a digest sink that consumes every byte as it is
/// produced.
pub fn encode_to<W: Write>(value: &Value, writer: &mut W) -> Result<(), BencodeError> {
    match value {
        Value::Integer(i) => {
            write!(writer, "i{}e", i)?;
        }
        Value::Bytes(b) => {
            write!(writer, "{}:", b.len())?;
            writer.write_all(b)?;
        }
        Value::List(l) => {
            writer.write_all(b"l")?;
            for item in l {
                encode_to(item, writer)?;
            }
            writer.write_all(b"e")?;
        }
        Value::Dict(d) => {
            writer.write_all(b"d")?;
            for (key, val) in d {
                write!(writer, "{}:", key.len())?;
                writer.write_all(key)?;
                encode_to(val, writer)?;
            }
            writer.write_all(b"e")?;
        }
    }
    Ok(())
}
