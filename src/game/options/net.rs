use serde::{Deserialize, Serialize};

use super::{OptionKind, OptionValue};
use crate::game::types::OptionId;

/// Bytes of per-item overhead on the wire (the option id).
pub const NET_ID_BYTES: usize = 4;

/// One option value as it travels between peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetData {
    pub id: OptionId,
    pub data: Vec<u8>,
}

impl NetData {
    pub fn new(id: OptionId, value: OptionValue) -> Self {
        Self {
            id,
            data: encode_value(value),
        }
    }

    pub fn encoded_len(&self) -> usize {
        NET_ID_BYTES + self.data.len()
    }
}

/// Toggle = 1 byte, number = f32 LE, enum = u32 LE.
pub fn encode_value(value: OptionValue) -> Vec<u8> {
    match value {
        OptionValue::Toggle(on) => vec![u8::from(on)],
        OptionValue::Number(n) => n.to_le_bytes().to_vec(),
        OptionValue::Enum(index) => (index as u32).to_le_bytes().to_vec(),
    }
}

/// Decode a payload for an option of `kind`. `None` when the length does not fit.
pub fn decode_value(kind: &OptionKind, data: &[u8]) -> Option<OptionValue> {
    match kind {
        OptionKind::Toggle => match data {
            [b] => Some(OptionValue::Toggle(*b != 0)),
            _ => None,
        },
        OptionKind::Number(_) => {
            let bytes: [u8; 4] = data.try_into().ok()?;
            let n = f32::from_le_bytes(bytes);
            n.is_finite().then_some(OptionValue::Number(n))
        }
        OptionKind::Enum { .. } => {
            let bytes: [u8; 4] = data.try_into().ok()?;
            Some(OptionValue::Enum(u32::from_le_bytes(bytes) as usize))
        }
    }
}

/// Pack items, in order, into chunks of at most `max_bytes` encoded bytes.
///
/// An item larger than `max_bytes` on its own still goes out, alone in its chunk.
pub fn chunk_net_data(
    items: impl IntoIterator<Item = NetData>,
    max_bytes: usize,
) -> Vec<Vec<NetData>> {
    let mut chunks = Vec::new();
    let mut current: Vec<NetData> = Vec::new();
    let mut size = 0;

    for item in items {
        let len = item.encoded_len();
        if !current.is_empty() && size + len > max_bytes {
            chunks.push(std::mem::take(&mut current));
            size = 0;
        }
        size += len;
        current.push(item);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::options::NumberRange;

    fn item(id: u32, len: usize) -> NetData {
        NetData {
            id: OptionId(id),
            data: vec![0; len],
        }
    }

    #[test]
    fn chunks_respect_the_byte_limit_and_order() {
        // 5 bytes each: two fit into 12, the third starts a new chunk.
        let chunks = chunk_net_data((1..=5).map(|id| item(id, 1)), 12);
        let ids: Vec<Vec<u32>> = chunks
            .iter()
            .map(|c| c.iter().map(|d| d.id.0).collect())
            .collect();
        assert_eq!(ids, vec![vec![1, 2], vec![3, 4], vec![5]]);
        for chunk in &chunks {
            assert!(chunk.iter().map(NetData::encoded_len).sum::<usize>() <= 12);
        }
    }

    #[test]
    fn oversized_item_gets_its_own_chunk() {
        let chunks = chunk_net_data(vec![item(1, 1), item(2, 40), item(3, 1)], 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1], vec![item(2, 40)]);
        assert!(chunk_net_data(Vec::new(), 10).is_empty());
    }

    #[test]
    fn decode_checks_payload_shape() {
        let number = OptionKind::Number(NumberRange::new(0.0, 10.0, 0.25));
        assert_eq!(
            decode_value(&number, &encode_value(OptionValue::Number(2.5))),
            Some(OptionValue::Number(2.5))
        );
        assert_eq!(decode_value(&number, &[1, 2]), None);
        assert_eq!(decode_value(&number, &f32::NAN.to_le_bytes()), None);
        assert_eq!(decode_value(&OptionKind::Toggle, &[]), None);
        assert_eq!(
            decode_value(&OptionKind::Toggle, &[1]),
            Some(OptionValue::Toggle(true))
        );
    }
}
