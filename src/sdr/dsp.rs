use bytes::{Buf, BufMut, BytesMut};

/// Name of the only sample encoding the source produces.
pub const ITEM_TYPE: &str = "gr_complex";

/// Size in bytes of one `Complex` sample.
pub const ITEM_SIZE: usize = std::mem::size_of::<num_complex::Complex<f32>>();

/// Baseband IQ sample, interleaved the way the hardware and dump files store it.
pub type Complex = num_complex::Complex<f32>;

/// Appends samples as little-endian `f32` pairs: [i, q, i, q, ...].
pub fn encode(samples: &[Complex], dst: &mut BytesMut) {
    dst.reserve(samples.len() * ITEM_SIZE);
    for s in samples {
        dst.put_f32_le(s.re);
        dst.put_f32_le(s.im);
    }
}

/// Decodes whole samples from the front of `src`, leaving any trailing partial
/// sample in place.
pub fn decode(src: &mut BytesMut, dst: &mut Vec<Complex>) -> usize {
    let n = src.len() / ITEM_SIZE;
    dst.reserve(n);
    for _ in 0..n {
        let re = src.get_f32_le();
        let im = src.get_f32_le();
        dst.push(Complex { re, im });
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_size_is_two_floats() {
        assert_eq!(ITEM_SIZE, 8);
    }

    #[test]
    fn encode_writes_i_before_q() {
        let mut buf = BytesMut::new();
        encode(&[Complex::new(3.0, 4.0)], &mut buf);
        assert_eq!(&buf[0..4], &3.0f32.to_le_bytes());
        assert_eq!(&buf[4..8], &4.0f32.to_le_bytes());
    }

    #[test]
    fn decode_keeps_partial_sample() {
        let mut buf = BytesMut::new();
        encode(&[Complex::new(1.0, -1.0), Complex::new(0.5, 0.25)], &mut buf);
        buf.put_u8(0xff);

        let mut out = Vec::new();
        assert_eq!(decode(&mut buf, &mut out), 2);
        assert_eq!(out[1], Complex::new(0.5, 0.25));
        assert_eq!(buf.len(), 1);
    }
}
