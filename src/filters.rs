//! Stream filters: Flate and LZW decompression, Flate compression, and the
//! PNG-Up predictor post-filter (`spec.md` §4 Filters component).

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use crate::error::{Error, Result};

pub struct PredictorParams {
    pub predictor: i32,
    pub columns: usize,
    pub colors: usize,
    pub bits_per_component: usize,
}

pub fn decode(filter_name: &[u8], data: &[u8], predictor: Option<PredictorParams>) -> Result<Vec<u8>> {
    let decoded = match filter_name {
        b"FlateDecode" | b"Fl" => flate_decode(data)?,
        b"LZWDecode" | b"LZW" => lzw_decode(data)?,
        b"ASCII85Decode" | b"A85" | b"ASCIIHexDecode" | b"AHx" | b"RunLengthDecode" | b"RL" | b"DCTDecode"
        | b"JPXDecode" | b"CCITTFaxDecode" | b"JBIG2Decode" => {
            return Err(Error::UnsupportedFilter(String::from_utf8_lossy(filter_name).into_owned()));
        }
        other => return Err(Error::UnsupportedFilter(String::from_utf8_lossy(other).into_owned())),
    };

    match predictor {
        Some(p) if p.predictor >= 10 => Ok(png_predictor_decode(&decoded, &p)),
        Some(p) if p.predictor == 2 => Ok(tiff_predictor_decode(&decoded, &p)),
        _ => Ok(decoded),
    }
}

pub fn flate_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| Error::InvalidStream(format!("flate decode failed: {e}")))?;
    Ok(out)
}

pub fn flate_encode(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("writing to an in-memory encoder cannot fail");
    encoder.finish().expect("finishing an in-memory encoder cannot fail")
}

pub fn lzw_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = weezl::decode::Decoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8);
    let mut out = Vec::new();
    decoder
        .into_stream(&mut out)
        .decode_all(data)
        .status
        .map_err(|e| Error::InvalidStream(format!("LZW decode failed: {e}")))?;
    Ok(out)
}

/// Undo the PNG "Up" predictor (`spec.md` §4.3's `DecodeParms/Predictor = 12`):
/// each row is XORed with the corresponding byte of the row above it, prefixed
/// by a one-byte filter-type tag per row.
fn png_predictor_decode(data: &[u8], params: &PredictorParams) -> Vec<u8> {
    let bpp = ((params.colors * params.bits_per_component) as f64 / 8.0).ceil().max(1.0) as usize;
    let row_bytes = (params.columns * params.colors * params.bits_per_component + 7) / 8;
    let stride = row_bytes + 1;
    let mut out = Vec::with_capacity(data.len() / stride.max(1) * row_bytes);
    let mut prev_row = vec![0u8; row_bytes];

    for chunk in data.chunks(stride) {
        if chunk.len() < 2 {
            break;
        }
        let filter_type = chunk[0];
        let mut row = chunk[1..].to_vec();
        row.resize(row_bytes, 0);
        match filter_type {
            0 => {}
            2 => {
                // Up: row[i] += prev_row[i]
                for i in 0..row_bytes {
                    row[i] = row[i].wrapping_add(prev_row[i]);
                }
            }
            1 => {
                // Sub: row[i] += row[i - bpp]
                for i in bpp..row_bytes {
                    row[i] = row[i].wrapping_add(row[i - bpp]);
                }
            }
            3 => {
                // Average
                for i in 0..row_bytes {
                    let a = if i >= bpp { row[i - bpp] as u16 } else { 0 };
                    let b = prev_row[i] as u16;
                    row[i] = row[i].wrapping_add(((a + b) / 2) as u8);
                }
            }
            4 => {
                // Paeth
                for i in 0..row_bytes {
                    let a = if i >= bpp { row[i - bpp] } else { 0 };
                    let b = prev_row[i];
                    let c = if i >= bpp { prev_row[i - bpp] } else { 0 };
                    row[i] = row[i].wrapping_add(paeth(a, b, c));
                }
            }
            _ => {}
        }
        out.extend_from_slice(&row);
        prev_row = row;
    }
    out
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let (a, b, c) = (a as i32, b as i32, c as i32);
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();
    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}

fn tiff_predictor_decode(data: &[u8], params: &PredictorParams) -> Vec<u8> {
    let row_bytes = (params.columns * params.colors * params.bits_per_component + 7) / 8;
    let bpp = ((params.colors * params.bits_per_component) as f64 / 8.0).ceil().max(1.0) as usize;
    let mut out = data.to_vec();
    for row in out.chunks_mut(row_bytes) {
        for i in bpp..row.len() {
            row[i] = row[i].wrapping_add(row[i - bpp]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flate_round_trip() {
        let original = b"the quick brown fox jumps over the lazy dog".repeat(4);
        let compressed = flate_encode(&original);
        let decompressed = flate_decode(&compressed).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn png_up_predictor_identity_on_zero_filter() {
        let params = PredictorParams { predictor: 12, columns: 3, colors: 1, bits_per_component: 8 };
        let mut row = vec![0u8]; // filter type 0 = None
        row.extend_from_slice(&[1, 2, 3]);
        let decoded = png_predictor_decode(&row, &params);
        assert_eq!(decoded, vec![1, 2, 3]);
    }

    #[test]
    fn png_up_predictor_accumulates_across_rows() {
        let params = PredictorParams { predictor: 12, columns: 2, colors: 1, bits_per_component: 8 };
        let mut data = vec![0u8, 1, 1]; // row0 = [1,1], filter None
        data.extend_from_slice(&[2, 1, 1]); // row1 = up(prev)+[1,1] = [2,2]
        let decoded = png_predictor_decode(&data, &params);
        assert_eq!(decoded, vec![1, 1, 2, 2]);
    }
}
