// Lua table: an array part for keys 1..n plus an insertion-ordered hash part.
//
// Hash entries live in `nodes`; `index` maps a key to its node. Assigning nil
// leaves a dead node behind so that `next` can continue from a key removed
// during traversal. Dead nodes are compacted away only when a new key is
// inserted.

use ahash::RandomState;
use std::collections::HashMap;

use crate::lua_value::lua_number::float_to_integer;
use crate::lua_value::{LuaValue, TableRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("index is nil")]
    NilIndex,
    #[error("index is NaN")]
    NaNIndex,
    #[error("invalid key to 'next'")]
    InvalidNextKey,
}

#[derive(Clone)]
struct Node {
    key: LuaValue,
    value: LuaValue,
}

pub struct LuaTable {
    array: Vec<LuaValue>,
    nodes: Vec<Node>,
    index: HashMap<LuaValue, usize, RandomState>,
    dead: usize,
    metatable: Option<TableRef>,
}

/// Integral floats become integer keys so that `t[1]` and `t[1.0]` are the
/// same slot.
fn normalize_key(key: LuaValue) -> Result<LuaValue, TableError> {
    match key {
        LuaValue::Nil => Err(TableError::NilIndex),
        LuaValue::Float(f) if f.is_nan() => Err(TableError::NaNIndex),
        LuaValue::Float(f) => Ok(float_to_integer(f).map_or(key, LuaValue::Integer)),
        _ => Ok(key),
    }
}

impl LuaTable {
    pub fn new(narr: usize, nrec: usize) -> Self {
        LuaTable {
            array: Vec::with_capacity(narr),
            nodes: Vec::with_capacity(nrec),
            index: HashMap::with_capacity_and_hasher(nrec, RandomState::new()),
            dead: 0,
            metatable: None,
        }
    }

    pub fn metatable(&self) -> Option<&TableRef> {
        self.metatable.as_ref()
    }

    pub fn set_metatable(&mut self, mt: Option<TableRef>) {
        self.metatable = mt;
    }

    /// Raw read. Absent keys, nil and NaN read as nil.
    pub fn get(&self, key: &LuaValue) -> LuaValue {
        match key {
            LuaValue::Integer(i) => self.get_int(*i),
            LuaValue::Float(f) => match float_to_integer(*f) {
                Some(i) => self.get_int(i),
                None => self.get_node(key),
            },
            LuaValue::Nil => LuaValue::Nil,
            _ => self.get_node(key),
        }
    }

    pub fn get_int(&self, i: i64) -> LuaValue {
        if i >= 1 && (i as u64) <= self.array.len() as u64 {
            return self.array[(i - 1) as usize].clone();
        }
        self.get_node(&LuaValue::Integer(i))
    }

    pub fn get_str(&self, key: &str) -> LuaValue {
        self.get_node(&LuaValue::from(key))
    }

    fn get_node(&self, key: &LuaValue) -> LuaValue {
        match self.index.get(key) {
            Some(&pos) => self.nodes[pos].value.clone(),
            None => LuaValue::Nil,
        }
    }

    /// Raw write. Assigning nil removes the key.
    pub fn raw_set(&mut self, key: LuaValue, value: LuaValue) -> Result<(), TableError> {
        match normalize_key(key)? {
            LuaValue::Integer(i) => self.set_int(i, value),
            key => self.set_node(key, value),
        }
        Ok(())
    }

    pub fn set_int(&mut self, i: i64, value: LuaValue) {
        let len = self.array.len();
        if i >= 1 && (i as u64) <= len as u64 {
            self.array[(i - 1) as usize] = value;
        } else if i as u64 == len as u64 + 1 && !value.is_nil() {
            self.array.push(value);
            self.migrate_to_array();
        } else {
            self.set_node(LuaValue::Integer(i), value);
        }
    }

    /// Moves keys that now continue the array out of the hash part.
    fn migrate_to_array(&mut self) {
        loop {
            let next = LuaValue::Integer(self.array.len() as i64 + 1);
            let Some(&pos) = self.index.get(&next) else {
                break;
            };
            let value = std::mem::take(&mut self.nodes[pos].value);
            if value.is_nil() {
                break;
            }
            self.dead += 1;
            self.array.push(value);
        }
    }

    fn set_node(&mut self, key: LuaValue, value: LuaValue) {
        if let Some(&pos) = self.index.get(&key) {
            let node = &mut self.nodes[pos];
            match (node.value.is_nil(), value.is_nil()) {
                (false, true) => self.dead += 1,
                (true, false) => self.dead -= 1,
                _ => {}
            }
            node.value = value;
            return;
        }
        if value.is_nil() {
            return;
        }
        if self.dead > 8 && self.dead * 2 > self.nodes.len() {
            self.compact();
        }
        self.index.insert(key.clone(), self.nodes.len());
        self.nodes.push(Node { key, value });
    }

    fn compact(&mut self) {
        self.nodes.retain(|node| !node.value.is_nil());
        self.index.clear();
        for (pos, node) in self.nodes.iter().enumerate() {
            self.index.insert(node.key.clone(), pos);
        }
        self.dead = 0;
    }

    fn live_nodes(&self) -> usize {
        self.nodes.len() - self.dead
    }

    /// A border: some `n` with `t[n] ~= nil` (or `n == 0`) and
    /// `t[n + 1] == nil`.
    pub fn len(&self) -> usize {
        let n = self.array.len();
        if n > 0 && self.array[n - 1].is_nil() {
            // t[0] counts as present, t[n] is nil
            let (mut i, mut j) = (0usize, n);
            while j - i > 1 {
                let m = (i + j) / 2;
                if self.array[m - 1].is_nil() {
                    j = m;
                } else {
                    i = m;
                }
            }
            return i;
        }
        if self.live_nodes() == 0 {
            return n;
        }
        self.hash_border(n)
    }

    fn hash_border(&self, start: usize) -> usize {
        let mut i = start;
        let mut j = start + 1;
        while !self.get_int(j as i64).is_nil() {
            i = j;
            if j > (i64::MAX as usize) / 2 {
                // pathological table: fall back to a linear scan
                let mut k = 1i64;
                while !self.get_int(k).is_nil() {
                    k += 1;
                }
                return (k - 1) as usize;
            }
            j *= 2;
        }
        while j - i > 1 {
            let m = (i + j) / 2;
            if self.get_int(m as i64).is_nil() {
                j = m;
            } else {
                i = m;
            }
        }
        i
    }

    pub fn is_empty(&self) -> bool {
        self.array.iter().all(LuaValue::is_nil) && self.live_nodes() == 0
    }

    /// Entry following `key` in traversal order; nil starts the traversal.
    /// Keys assigned nil during the traversal may still be passed back in.
    pub fn next(&self, key: &LuaValue) -> Result<Option<(LuaValue, LuaValue)>, TableError> {
        let n = self.array.len();
        let start = match key {
            LuaValue::Nil => 0,
            _ => {
                let key = normalize_key(key.clone()).map_err(|_| TableError::InvalidNextKey)?;
                match key {
                    LuaValue::Integer(i) if i >= 1 && (i as u64) <= n as u64 => i as usize,
                    _ => match self.index.get(&key) {
                        Some(&pos) => n + pos + 1,
                        None => return Err(TableError::InvalidNextKey),
                    },
                }
            }
        };

        for p in start.min(n)..n {
            if !self.array[p].is_nil() {
                return Ok(Some((LuaValue::Integer(p as i64 + 1), self.array[p].clone())));
            }
        }
        for node in &self.nodes[start.saturating_sub(n)..] {
            if !node.value.is_nil() {
                return Ok(Some((node.key.clone(), node.value.clone())));
            }
        }
        Ok(None)
    }

    /// Live entries, array part first.
    pub fn iter(&self) -> impl Iterator<Item = (LuaValue, LuaValue)> + '_ {
        let array = self
            .array
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nil())
            .map(|(i, v)| (LuaValue::Integer(i as i64 + 1), v.clone()));
        let nodes = self
            .nodes
            .iter()
            .filter(|node| !node.value.is_nil())
            .map(|node| (node.key.clone(), node.value.clone()));
        array.chain(nodes)
    }
}

impl Default for LuaTable {
    fn default() -> Self {
        LuaTable::new(0, 0)
    }
}

impl std::fmt::Debug for LuaTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_keys_share_integer_slots() {
        let mut t = LuaTable::new(0, 0);
        t.raw_set(LuaValue::integer(1), LuaValue::from("a")).unwrap();
        assert_eq!(t.get(&LuaValue::float(1.0)), LuaValue::from("a"));
        t.raw_set(LuaValue::float(2.0), LuaValue::from("b")).unwrap();
        assert_eq!(t.get_int(2), LuaValue::from("b"));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn nil_and_nan_keys_rejected() {
        let mut t = LuaTable::new(0, 0);
        assert_eq!(
            t.raw_set(LuaValue::nil(), LuaValue::integer(1)),
            Err(TableError::NilIndex)
        );
        assert_eq!(
            t.raw_set(LuaValue::float(f64::NAN), LuaValue::integer(1)),
            Err(TableError::NaNIndex)
        );
        assert!(t.get(&LuaValue::float(f64::NAN)).is_nil());
    }

    #[test]
    fn hash_part_migrates_into_array() {
        let mut t = LuaTable::new(0, 0);
        t.set_int(3, LuaValue::integer(30));
        t.set_int(2, LuaValue::integer(20));
        assert_eq!(t.len(), 0);
        t.set_int(1, LuaValue::integer(10));
        assert_eq!(t.len(), 3);
        assert_eq!(t.array.len(), 3);
        assert_eq!(t.get_int(3), LuaValue::integer(30));
    }

    #[test]
    fn border_with_holes_is_valid() {
        let mut t = LuaTable::new(0, 0);
        for i in 1..=10 {
            t.set_int(i, LuaValue::integer(i));
        }
        t.set_int(10, LuaValue::nil());
        t.set_int(5, LuaValue::nil());
        let n = t.len() as i64;
        assert!(n == 0 || !t.get_int(n).is_nil());
        assert!(t.get_int(n + 1).is_nil());
    }

    #[test]
    fn next_survives_clearing_visited_keys() {
        let mut t = LuaTable::new(0, 0);
        for i in 1..=4 {
            t.set_int(i, LuaValue::integer(i));
        }
        for name in ["x", "y", "z"] {
            t.raw_set(LuaValue::from(name), LuaValue::boolean(true)).unwrap();
        }

        let mut key = LuaValue::nil();
        let mut seen = 0;
        while let Some((k, _)) = t.next(&key).unwrap() {
            t.raw_set(k.clone(), LuaValue::nil()).unwrap();
            key = k;
            seen += 1;
        }
        assert_eq!(seen, 7);
        assert!(t.is_empty());
    }

    #[test]
    fn next_rejects_unknown_key() {
        let t = LuaTable::new(0, 0);
        assert_eq!(
            t.next(&LuaValue::from("missing")),
            Err(TableError::InvalidNextKey)
        );
    }

    #[test]
    fn dead_nodes_are_compacted_on_insert() {
        let mut t = LuaTable::new(0, 0);
        for i in 0..32 {
            t.raw_set(LuaValue::from(format!("k{}", i)), LuaValue::integer(i))
                .unwrap();
        }
        for i in 0..32 {
            t.raw_set(LuaValue::from(format!("k{}", i)), LuaValue::nil())
                .unwrap();
        }
        t.raw_set(LuaValue::from("fresh"), LuaValue::integer(1)).unwrap();
        assert_eq!(t.nodes.len(), 1);
        assert_eq!(t.get_str("fresh"), LuaValue::integer(1));
    }
}
