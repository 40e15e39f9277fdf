//! Flat XML serialization of an [`ExportDocument`].
//!
//! Output is UTF-8 with an XML declaration and two-space indentation. Given
//! the same document the bytes are always identical; the only time-dependent
//! value is the root's `exported` attribute.

use std::io::Write;

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::document::{Cell, DataTable, ExportDocument, SchemaTable};
use crate::error::{ExportError, Result};

const INDENT_SIZE: usize = 2;

/// Serialize a document into a byte buffer. Returns the bytes and the number
/// of elements written below the root.
pub fn to_xml_bytes(document: &ExportDocument) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let count = write_document(document, &mut buf)?;
    Ok((buf, count))
}

/// Serialize a document to a writer. Returns the number of elements written
/// below the root.
pub fn write_document<W: Write>(document: &ExportDocument, out: W) -> Result<usize> {
    let mut xml = XmlWriter::new(out);

    xml.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let exported = document.meta.exported_attr();
    let root = BytesStart::new("database").with_attributes([
        ("source", document.meta.source.as_str()),
        ("exported", exported.as_str()),
    ]);
    xml.event(Event::Start(root))?;

    let has_schema = !document.generators.is_empty() || !document.schema.is_empty();
    xml.open("schema", Vec::new(), has_schema)?;
    if !document.generators.is_empty() {
        xml.open("generators", Vec::new(), true)?;
        for generator in &document.generators {
            xml.empty(
                "generator",
                vec![
                    ("name", generator.name.clone()),
                    ("value", generator.value.to_string()),
                ],
            )?;
        }
        xml.close("generators")?;
    }
    for table in &document.schema {
        write_schema_table(&mut xml, table)?;
    }
    if has_schema {
        xml.close("schema")?;
    }

    xml.open("data", Vec::new(), !document.data.is_empty())?;
    for table in &document.data {
        write_data_table(&mut xml, table)?;
    }
    if !document.data.is_empty() {
        xml.close("data")?;
    }

    xml.event(Event::End(BytesEnd::new("database")))?;
    xml.finish()
}

fn write_schema_table<W: Write>(xml: &mut XmlWriter<W>, table: &SchemaTable) -> Result<()> {
    let has_children = !table.columns.is_empty() || !table.foreign_keys.is_empty();
    xml.open("table", vec![("name", table.name.clone())], has_children)?;

    for column in &table.columns {
        let mut attrs = vec![
            ("name", column.name.clone()),
            ("type", column.type_name.clone()),
        ];
        if column.not_null {
            attrs.push(("notnull", "true".to_string()));
        }
        if column.pk {
            attrs.push(("pk", "true".to_string()));
        }
        xml.empty("column", attrs)?;
    }

    for fk in &table.foreign_keys {
        xml.empty(
            "fk",
            vec![
                ("name", fk.name.clone()),
                ("column", fk.column.clone()),
                ("references", fk.references()),
            ],
        )?;
    }

    if has_children {
        xml.close("table")?;
    }
    Ok(())
}

fn write_data_table<W: Write>(xml: &mut XmlWriter<W>, table: &DataTable) -> Result<()> {
    let attrs = vec![
        ("name", table.name.clone()),
        ("count", table.rows.len().to_string()),
    ];
    xml.open("table", attrs, !table.rows.is_empty())?;

    for row in &table.rows {
        xml.open("row", Vec::new(), !row.cells.is_empty())?;
        for cell in &row.cells {
            write_cell(xml, cell)?;
        }
        if !row.cells.is_empty() {
            xml.close("row")?;
        }
    }

    if !table.rows.is_empty() {
        xml.close("table")?;
    }
    Ok(())
}

fn write_cell<W: Write>(xml: &mut XmlWriter<W>, cell: &Cell) -> Result<()> {
    let mut attrs = vec![
        ("name", cell.name.clone()),
        ("type", cell.type_name.clone()),
    ];
    if cell.value.is_null() {
        attrs.push(("null", "true".to_string()));
        return xml.empty("col", attrs);
    }
    if let Some(encoding) = cell.value.encoding() {
        attrs.push(("enc", encoding.as_str().to_string()));
    }

    let text = cell.value.text();
    if text.is_empty() {
        return xml.empty("col", attrs);
    }
    xml.text_element("col", attrs, text)
}

/// Indenting writer that counts every element below the root.
struct XmlWriter<W: Write> {
    writer: Writer<W>,
    elements: usize,
}

impl<W: Write> XmlWriter<W> {
    fn new(out: W) -> Self {
        Self {
            writer: Writer::new_with_indent(out, b' ', INDENT_SIZE),
            elements: 0,
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| ExportError::Xml(e.to_string()))
    }

    fn start<'a>(name: &'a str, attrs: &'a [(&'a str, String)]) -> BytesStart<'a> {
        BytesStart::new(name).with_attributes(attrs.iter().map(|(k, v)| (*k, v.as_str())))
    }

    /// Open an element, or write it self-closed when it has no children.
    fn open(
        &mut self,
        name: &str,
        attrs: Vec<(&str, String)>,
        has_children: bool,
    ) -> Result<()> {
        self.elements += 1;
        let start = Self::start(name, &attrs);
        if has_children {
            self.event(Event::Start(start))
        } else {
            self.event(Event::Empty(start))
        }
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str, attrs: Vec<(&str, String)>) -> Result<()> {
        self.open(name, attrs, false)
    }

    fn text_element(&mut self, name: &str, attrs: Vec<(&str, String)>, text: &str) -> Result<()> {
        self.elements += 1;
        self.event(Event::Start(Self::start(name, &attrs)))?;
        self.event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
        self.close(name)
    }

    fn finish(mut self) -> Result<usize> {
        self.writer.get_mut().write_all(b"\n")?;
        Ok(self.elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Generator;
    use crate::document::{DataRow, DocumentMeta, SchemaColumn};
    use crate::format::{Encoding, Formatted};
    use chrono::NaiveDate;

    fn meta() -> DocumentMeta {
        DocumentMeta {
            source: "db.fdb".to_string(),
            exported: NaiveDate::from_ymd_opt(2025, 3, 4)
                .unwrap()
                .and_hms_opt(5, 6, 7)
                .unwrap(),
        }
    }

    fn empty_document() -> ExportDocument {
        ExportDocument {
            meta: meta(),
            generators: vec![],
            schema: vec![],
            data: vec![],
        }
    }

    fn render(document: &ExportDocument) -> (String, usize) {
        let (bytes, count) = to_xml_bytes(document).unwrap();
        (String::from_utf8(bytes).unwrap(), count)
    }

    #[test]
    fn test_empty_document() {
        let (xml, count) = render(&empty_document());
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <database source=\"db.fdb\" exported=\"2025-03-04T05:06:07\">\n\
             \x20\x20<schema/>\n\
             \x20\x20<data/>\n\
             </database>\n"
        );
        assert_eq!(count, 2);
    }

    #[test]
    fn test_generators_block() {
        let mut document = empty_document();
        document.generators.push(Generator {
            name: "GEN_ACCOUNT_ID".to_string(),
            value: 42,
        });
        let (xml, count) = render(&document);
        assert!(xml.contains(
            "  <schema>\n    <generators>\n      <generator name=\"GEN_ACCOUNT_ID\" value=\"42\"/>\n    </generators>\n  </schema>\n"
        ));
        assert_eq!(count, document.element_count());
    }

    #[test]
    fn test_cells_null_and_base64() {
        let mut document = empty_document();
        document.data.push(DataTable {
            name: "T".to_string(),
            rows: vec![DataRow {
                cells: vec![
                    Cell {
                        name: "A".to_string(),
                        type_name: "INTEGER".to_string(),
                        value: Formatted::Null,
                    },
                    Cell {
                        name: "B".to_string(),
                        type_name: "BLOB SUB_TYPE BINARY".to_string(),
                        value: Formatted::Text {
                            text: "//4=".to_string(),
                            encoding: Some(Encoding::Base64),
                        },
                    },
                    Cell {
                        name: "C".to_string(),
                        type_name: "VARCHAR(5)".to_string(),
                        value: Formatted::Text {
                            text: "a<b&c".to_string(),
                            encoding: None,
                        },
                    },
                ],
            }],
        });
        let (xml, count) = render(&document);
        assert!(xml.contains("<col name=\"A\" type=\"INTEGER\" null=\"true\"/>"));
        assert!(xml.contains("<col name=\"B\" type=\"BLOB SUB_TYPE BINARY\" enc=\"base64\">//4=</col>"));
        assert!(xml.contains("<col name=\"C\" type=\"VARCHAR(5)\">a&lt;b&amp;c</col>"));
        assert!(xml.contains("<table name=\"T\" count=\"1\">"));
        // data, table, row, 3 cols, plus the empty schema
        assert_eq!(count, 7);
    }

    #[test]
    fn test_empty_table_is_self_closed() {
        let mut document = empty_document();
        document.schema.push(SchemaTable {
            name: "EMPTY".to_string(),
            columns: vec![SchemaColumn {
                name: "ID".to_string(),
                type_name: "INTEGER".to_string(),
                not_null: true,
                pk: true,
            }],
            foreign_keys: vec![],
        });
        document.data.push(DataTable {
            name: "EMPTY".to_string(),
            rows: vec![],
        });
        let (xml, _) = render(&document);
        assert!(xml.contains("<column name=\"ID\" type=\"INTEGER\" notnull=\"true\" pk=\"true\"/>"));
        assert!(xml.contains("    <table name=\"EMPTY\" count=\"0\"/>\n"));
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let mut document = empty_document();
        document.meta.source = "a&b\".fdb".to_string();
        let (xml, _) = render(&document);
        assert!(xml.contains("source=\"a&amp;b&quot;.fdb\""));
    }
}
