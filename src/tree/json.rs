//! JSON implementation of the tree serialization protocol.
//!
//! The writer assembles a `serde_json::Value` through a frame stack and hands
//! the finished document back with [`JsonTreeWriter::finish`]; text output is
//! a `serde_json::to_writer` call away. The reader walks a borrowed `Value`,
//! so `skip` is free and member dispatch is plain map iteration.

use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};
use crate::tree::{TreeReader, TreeWriter};

enum Frame {
    Object {
        members: Map<String, Value>,
        pending: Option<String>,
    },
    List(Vec<Value>),
}

/// Builds a JSON document from tree-writer tokens.
#[derive(Default)]
pub struct JsonTreeWriter {
    stack: Vec<Frame>,
    root: Option<Value>,
}

impl JsonTreeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the completed document.
    pub fn finish(self) -> Result<Value> {
        if !self.stack.is_empty() {
            return Err(Error::format("unclosed object or list in tree writer"));
        }
        self.root
            .ok_or_else(|| Error::format("tree writer produced no document"))
    }

    fn attach(&mut self, value: Value) -> Result<()> {
        match self.stack.last_mut() {
            None => {
                if self.root.is_some() {
                    return Err(Error::format("multiple root values in tree writer"));
                }
                self.root = Some(value);
                Ok(())
            }
            Some(Frame::Object { members, pending }) => {
                let name = pending
                    .take()
                    .ok_or_else(|| Error::format("value written without a field name"))?;
                members.insert(name, value);
                Ok(())
            }
            Some(Frame::List(items)) => {
                items.push(value);
                Ok(())
            }
        }
    }
}

impl TreeWriter for JsonTreeWriter {
    fn start_object(&mut self) -> Result<()> {
        self.stack.push(Frame::Object {
            members: Map::new(),
            pending: None,
        });
        Ok(())
    }

    fn end_object(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Frame::Object { members, pending }) => {
                if pending.is_some() {
                    return Err(Error::format("object ended with a dangling field name"));
                }
                self.attach(Value::Object(members))
            }
            _ => Err(Error::format("end_object without matching start_object")),
        }
    }

    fn field(&mut self, name: &str) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::Object { pending, .. }) => {
                if pending.is_some() {
                    return Err(Error::format("field name written twice in a row"));
                }
                *pending = Some(name.to_owned());
                Ok(())
            }
            _ => Err(Error::format("field name outside an object")),
        }
    }

    fn start_list(&mut self) -> Result<()> {
        self.stack.push(Frame::List(Vec::new()));
        Ok(())
    }

    fn end_list(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Frame::List(items)) => self.attach(Value::Array(items)),
            _ => Err(Error::format("end_list without matching start_list")),
        }
    }

    fn value_u64(&mut self, value: u64) -> Result<()> {
        self.attach(Value::Number(Number::from(value)))
    }

    fn value_i64(&mut self, value: i64) -> Result<()> {
        self.attach(Value::Number(Number::from(value)))
    }

    fn value_f64(&mut self, value: f64) -> Result<()> {
        let number = Number::from_f64(value)
            .ok_or_else(|| Error::format("non-finite float cannot be serialized"))?;
        self.attach(Value::Number(number))
    }

    fn value_bool(&mut self, value: bool) -> Result<()> {
        self.attach(Value::Bool(value))
    }

    fn value_str(&mut self, value: &str) -> Result<()> {
        self.attach(Value::String(value.to_owned()))
    }

    fn value_null(&mut self) -> Result<()> {
        self.attach(Value::Null)
    }
}

/// Reads tree-reader tokens out of a borrowed JSON document.
pub struct JsonTreeReader<'a> {
    value: &'a Value,
}

impl<'a> JsonTreeReader<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }
}

impl<'a> TreeReader for JsonTreeReader<'a> {
    fn read_object(
        &mut self,
        visit: &mut dyn FnMut(&mut dyn TreeReader, &str) -> Result<bool>,
    ) -> Result<()> {
        let members = self
            .value
            .as_object()
            .ok_or_else(|| Error::format("expected a JSON object"))?;
        for (name, value) in members {
            let mut child = JsonTreeReader { value };
            // An unhandled member needs no explicit skip; the child reader is
            // simply dropped.
            visit(&mut child, name)?;
        }
        Ok(())
    }

    fn read_list(
        &mut self,
        visit: &mut dyn FnMut(&mut dyn TreeReader) -> Result<()>,
    ) -> Result<()> {
        let items = self
            .value
            .as_array()
            .ok_or_else(|| Error::format("expected a JSON array"))?;
        for item in items {
            let mut child = JsonTreeReader { value: item };
            visit(&mut child)?;
        }
        Ok(())
    }

    fn read_u64(&mut self) -> Result<u64> {
        self.value
            .as_u64()
            .ok_or_else(|| Error::format("expected an unsigned JSON number"))
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.value
            .as_i64()
            .ok_or_else(|| Error::format("expected a signed JSON number"))
    }

    fn read_f64(&mut self) -> Result<f64> {
        self.value
            .as_f64()
            .ok_or_else(|| Error::format("expected a JSON number"))
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.value
            .as_bool()
            .ok_or_else(|| Error::format("expected a JSON boolean"))
    }

    fn read_str(&mut self) -> Result<String> {
        self.value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| Error::format("expected a JSON string"))
    }

    fn skip(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::{read_sample, write_sample};

    #[test]
    fn sample_document_round_trips() {
        let mut writer = JsonTreeWriter::new();
        write_sample(&mut writer).unwrap();
        let document = writer.finish().unwrap();

        let mut reader = JsonTreeReader::new(&document);
        read_sample(&mut reader).unwrap();
    }

    #[test]
    fn defaults_are_omitted() {
        let mut writer = JsonTreeWriter::new();
        write_sample(&mut writer).unwrap();
        let document = writer.finish().unwrap();
        assert!(document.get("omitted").is_none());
        assert_eq!(document.get("count"), Some(&Value::from(3u64)));
    }

    #[test]
    fn unknown_members_are_tolerated() {
        let document: Value = serde_json::from_str(
            r#"{"count": 3, "title": "columns", "values": [1, 2, 3],
                "nested": {"signed": -42, "ratio": 0.5, "flag": true},
                "future_field": {"deep": [1, {"x": null}]}}"#,
        )
        .unwrap();
        let mut reader = JsonTreeReader::new(&document);
        read_sample(&mut reader).unwrap();
    }

    #[test]
    fn text_round_trip_preserves_the_document() {
        let mut writer = JsonTreeWriter::new();
        write_sample(&mut writer).unwrap();
        let document = writer.finish().unwrap();

        let text = serde_json::to_string(&document).unwrap();
        let reparsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(document, reparsed);
    }

    #[test]
    fn mismatched_tokens_are_format_errors() {
        let mut writer = JsonTreeWriter::new();
        assert!(matches!(
            writer.end_object(),
            Err(crate::error::Error::Format(_))
        ));

        let document = Value::Bool(true);
        let mut reader = JsonTreeReader::new(&document);
        assert!(matches!(
            reader.read_u64(),
            Err(crate::error::Error::Format(_))
        ));
    }
}
