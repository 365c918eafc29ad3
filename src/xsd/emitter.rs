//! XSD dataset document emission

use crate::error::{Error, Result};
use crate::schema::{Column, ForeignKey, PrimaryKey, Schema, Table};
use crate::xsd::writer::XmlWriter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const SCHEMA_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
pub const SCHEMA_PREFIX: &str = "xs";
pub const METADATA_NAMESPACE: &str = "urn:schemas-microsoft-com:xml-msdata";
pub const METADATA_PREFIX: &str = "msdata";

/// Canonical 8-4-4-4-12 GUID form; XSD patterns are implicitly anchored
pub const GUID_PATTERN: &str = "[0-9a-fA-F]{8}-([0-9a-fA-F]{4}-){3}[0-9a-fA-F]{12}";
const GUID_DATA_TYPE: &str = "System.Guid";

/// Compositor used for the columns of each table element
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnGroup {
    Sequence,
    #[default]
    All,
}

impl ColumnGroup {
    fn element_name(self) -> &'static str {
        match self {
            ColumnGroup::Sequence => "sequence",
            ColumnGroup::All => "all",
        }
    }
}

/// Structural choices for the generated document
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    /// Wrap table elements in an unbounded `xs:choice`
    pub dataset_choice: bool,
    pub column_group: ColumnGroup,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            dataset_choice: true,
            column_group: ColumnGroup::All,
        }
    }
}

/// Everything besides the schema itself needed to emit a document
#[derive(Clone, Debug)]
pub struct XsdOptions {
    pub schema_id: String,
    pub dataset_name: String,
    /// Declare the `msdata` namespace and annotate relationships
    pub include_relationships: bool,
    pub layout: Layout,
}

impl XsdOptions {
    pub fn new(schema_id: impl Into<String>, dataset_name: impl Into<String>) -> Self {
        Self {
            schema_id: schema_id.into(),
            dataset_name: dataset_name.into(),
            include_relationships: false,
            layout: Layout::default(),
        }
    }

    /// Target namespace of the generated dataset
    pub fn target_namespace(&self) -> String {
        format!("http://tempuri.org/{}.xsd", self.dataset_name)
    }
}

fn xs(name: &str) -> String {
    format!("{}:{}", SCHEMA_PREFIX, name)
}

fn msdata(name: &str) -> String {
    format!("{}:{}", METADATA_PREFIX, name)
}

/// Write the XSD document for `schema` to `sink`
pub fn write_schema<W: Write>(schema: &Schema, options: &XsdOptions, sink: W) -> Result<W> {
    let metadata = options.include_relationships;
    let namespace = options.target_namespace();

    let mut writer = XmlWriter::new(sink);
    writer.declaration()?;
    writer
        .element(xs("schema"))
        .attr("id", &options.schema_id)
        .attr("targetNamespace", &namespace)
        .attr("xmlns", &namespace)
        .attr("xmlns:mstns", &namespace)
        .attr(format!("xmlns:{}", SCHEMA_PREFIX), SCHEMA_NAMESPACE)
        .attr("elementFormDefault", "qualified")
        .attr_if(metadata, format!("xmlns:{}", METADATA_PREFIX), METADATA_NAMESPACE)
        .children(|w| {
            write_dataset(w, schema, options)?;
            if metadata {
                write_relationships(w, &schema.foreign_keys)?;
            }
            Ok(())
        })?;

    Ok(writer.finish()?)
}

/// Write the XSD document to `path`.
///
/// Output goes to a temporary file in the same directory, renamed over
/// `path` only once the whole document is written.
pub fn write_schema_file(schema: &Schema, options: &XsdOptions, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let file = NamedTempFile::new_in(dir)?;
    debug!(temp = %file.path().display(), "writing schema to temporary file");

    let buffered = write_schema(schema, options, BufWriter::new(file))?;
    let file = buffered.into_inner().map_err(|e| Error::Write(e.into_error()))?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| Error::Write(e.error))?;

    info!(path = %path.display(), "schema written");
    Ok(())
}

fn write_dataset<W: Write>(w: &mut XmlWriter<W>, schema: &Schema, options: &XsdOptions) -> io::Result<()> {
    let metadata = options.include_relationships;
    let layout = options.layout;

    w.element(xs("element"))
        .attr("name", &options.dataset_name)
        .children(|w| {
            w.element(xs("complexType")).children(|w| {
                if layout.dataset_choice {
                    w.element(xs("choice"))
                        .attr("minOccurs", "0")
                        .attr("maxOccurs", "unbounded")
                        .children(|w| write_tables(w, &schema.tables, layout, metadata))
                } else {
                    write_tables(w, &schema.tables, layout, metadata)
                }
            })?;

            for primary_key in &schema.primary_keys {
                write_primary_key(w, primary_key, metadata)?;
            }
            Ok(())
        })
}

fn write_tables<W: Write>(w: &mut XmlWriter<W>, tables: &[Table], layout: Layout, metadata: bool) -> io::Result<()> {
    for table in tables {
        w.element(xs("element"))
            .attr("name", &table.name)
            .children(|w| {
                w.element(xs("complexType")).children(|w| {
                    w.element(xs(layout.column_group.element_name()))
                        .children(|w| {
                            for column in &table.columns {
                                write_column(w, column, metadata)?;
                            }
                            Ok(())
                        })
                })
            })?;
    }
    Ok(())
}

fn write_column<W: Write>(w: &mut XmlWriter<W>, column: &Column, metadata: bool) -> io::Result<()> {
    let base = xs(column.xsd_type().as_str());
    let element = w
        .element(xs("element"))
        .attr("name", &column.name)
        .attr("minOccurs", if column.nullable { "0" } else { "1" })
        .attr("maxOccurs", "1");

    if column.is_guid() {
        element
            .attr_if(metadata, msdata("DataType"), GUID_DATA_TYPE)
            .children(|w| write_restriction(w, &base, "pattern", GUID_PATTERN))
    } else if let Some(max_length) = column.max_length {
        element.children(|w| write_restriction(w, &base, "maxLength", &max_length.to_string()))
    } else {
        element
            .attr("type", &base)
            .attr_if(metadata && column.is_identity, msdata("AutoIncrement"), "true")
            .empty()
    }
}

fn write_restriction<W: Write>(w: &mut XmlWriter<W>, base: &str, facet: &str, value: &str) -> io::Result<()> {
    w.element(xs("simpleType")).children(|w| {
        w.element(xs("restriction"))
            .attr("base", base)
            .children(|w| w.element(xs(facet)).attr("value", value).empty())
    })
}

fn write_primary_key<W: Write>(w: &mut XmlWriter<W>, primary_key: &PrimaryKey, metadata: bool) -> io::Result<()> {
    w.element(xs("unique"))
        .attr("name", &primary_key.name)
        .attr_if(metadata, msdata("PrimaryKey"), "true")
        .children(|w| {
            w.element(xs("selector"))
                .attr("xpath", format!(".//mstns:{}", primary_key.table))
                .empty()?;
            for column in &primary_key.columns {
                w.element(xs("field"))
                    .attr("xpath", format!("mstns:{}", column))
                    .empty()?;
            }
            Ok(())
        })
}

fn write_relationships<W: Write>(w: &mut XmlWriter<W>, foreign_keys: &[ForeignKey]) -> io::Result<()> {
    w.element(xs("annotation")).children(|w| {
        w.element(xs("appinfo")).children(|w| {
            for foreign_key in foreign_keys {
                w.element(msdata("Relationship"))
                    .attr("name", &foreign_key.name)
                    .attr(msdata("parent"), &foreign_key.primary_key_table)
                    .attr(msdata("child"), &foreign_key.foreign_key_table)
                    .attr(msdata("parentkey"), &foreign_key.primary_key_column)
                    .attr(msdata("childkey"), &foreign_key.foreign_key_column)
                    .empty()?;
            }
            Ok(())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use roxmltree::{Document, Node};

    fn column(name: &str, data_type: &str, nullable: bool, max_length: Option<u32>, is_identity: bool) -> Column {
        Column {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable,
            max_length,
            is_identity,
        }
    }

    fn users_schema() -> Schema {
        Schema {
            tables: vec![Table {
                name: "Users".to_string(),
                columns: vec![
                    column("Id", "int", false, None, true),
                    column("Name", "varchar", true, Some(50), false),
                ],
            }],
            primary_keys: vec![PrimaryKey {
                name: "PK_Users".to_string(),
                table: "Users".to_string(),
                columns: vec!["Id".to_string()],
            }],
            foreign_keys: vec![],
        }
    }

    fn shop_schema() -> Schema {
        Schema {
            tables: vec![
                Table {
                    name: "Orders".to_string(),
                    columns: vec![
                        column("Id", "uniqueidentifier", false, None, false),
                        column("Total", "money", true, None, false),
                    ],
                },
                Table {
                    name: "OrderLines".to_string(),
                    columns: vec![
                        column("OrderId", "uniqueidentifier", false, None, false),
                        column("LineNo", "int", false, None, false),
                        column("Notes", "nvarchar", true, None, false),
                    ],
                },
            ],
            primary_keys: vec![
                PrimaryKey {
                    name: "PK_Orders".to_string(),
                    table: "Orders".to_string(),
                    columns: vec!["Id".to_string()],
                },
                PrimaryKey {
                    name: "PK_Order".to_string(),
                    table: "OrderLines".to_string(),
                    columns: vec!["OrderId".to_string(), "LineNo".to_string()],
                },
            ],
            foreign_keys: vec![ForeignKey {
                name: "FK_OrderLines_Orders".to_string(),
                primary_key_table: "Orders".to_string(),
                primary_key_column: "Id".to_string(),
                foreign_key_table: "OrderLines".to_string(),
                foreign_key_column: "OrderId".to_string(),
            }],
        }
    }

    fn render(schema: &Schema, options: &XsdOptions) -> String {
        let out = write_schema(schema, options, Vec::new()).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn options(include_relationships: bool) -> XsdOptions {
        XsdOptions {
            include_relationships,
            ..XsdOptions::new("ShopSchema", "ShopDataSet")
        }
    }

    fn xs_children<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Vec<Node<'a, 'i>> {
        node.children()
            .filter(|n| n.is_element() && n.has_tag_name((SCHEMA_NAMESPACE, name)))
            .collect()
    }

    fn xs_child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Node<'a, 'i> {
        xs_children(node, name)
            .into_iter()
            .next()
            .unwrap_or_else(|| panic!("no xs:{} under {:?}", name, node.tag_name()))
    }

    /// Table elements under the dataset, looking through an optional choice
    fn table_elements<'a, 'i>(doc: &'a Document<'i>) -> Vec<Node<'a, 'i>> {
        let dataset = xs_child(doc.root_element(), "element");
        let complex = xs_child(dataset, "complexType");
        match xs_children(complex, "choice").first() {
            Some(choice) => xs_children(*choice, "element"),
            None => xs_children(complex, "element"),
        }
    }

    fn column_element<'a, 'i>(doc: &'a Document<'i>, table: &str, column: &str) -> Node<'a, 'i> {
        doc.descendants()
            .filter(|n| n.attribute("name") == Some(table))
            .flat_map(|t| t.descendants())
            .find(|n| n.has_tag_name((SCHEMA_NAMESPACE, "element")) && n.attribute("name") == Some(column))
            .unwrap_or_else(|| panic!("no column {}.{}", table, column))
    }

    #[test]
    fn test_root_element_and_namespaces() {
        let xml = render(&users_schema(), &options(false));
        let doc = Document::parse(&xml).unwrap();
        let root = doc.root_element();

        assert!(root.has_tag_name((SCHEMA_NAMESPACE, "schema")));
        assert_eq!(root.attribute("id"), Some("ShopSchema"));
        assert_eq!(root.attribute("targetNamespace"), Some("http://tempuri.org/ShopDataSet.xsd"));
        assert_eq!(root.attribute("elementFormDefault"), Some("qualified"));
        assert_eq!(root.lookup_namespace_uri(Some("mstns")), Some("http://tempuri.org/ShopDataSet.xsd"));
        assert_eq!(root.lookup_namespace_uri(None), Some("http://tempuri.org/ShopDataSet.xsd"));

        let dataset = xs_child(root, "element");
        assert_eq!(dataset.attribute("name"), Some("ShopDataSet"));
    }

    #[test]
    fn test_users_scenario() {
        let xml = render(&users_schema(), &options(true));
        let doc = Document::parse(&xml).unwrap();

        let id = column_element(&doc, "Users", "Id");
        assert_eq!(id.attribute("type"), Some("xs:int"));
        assert_eq!(id.attribute("minOccurs"), Some("1"));
        assert_eq!(id.attribute("maxOccurs"), Some("1"));
        assert_eq!(id.attribute((METADATA_NAMESPACE, "AutoIncrement")), Some("true"));

        let name = column_element(&doc, "Users", "Name");
        assert_eq!(name.attribute("minOccurs"), Some("0"));
        assert_eq!(name.attribute("type"), None);
        let restriction = xs_child(xs_child(name, "simpleType"), "restriction");
        assert_eq!(restriction.attribute("base"), Some("xs:string"));
        assert_eq!(xs_child(restriction, "maxLength").attribute("value"), Some("50"));
    }

    #[test]
    fn test_nullability_drives_min_occurs() {
        let xml = render(&shop_schema(), &options(false));
        let doc = Document::parse(&xml).unwrap();
        let schema = shop_schema();

        for table in &schema.tables {
            for column in &table.columns {
                let element = column_element(&doc, &table.name, &column.name);
                let expected = if column.nullable { "0" } else { "1" };
                assert_eq!(element.attribute("minOccurs"), Some(expected), "{}", column);
            }
        }
    }

    #[test]
    fn test_unbounded_columns_get_direct_type() {
        let xml = render(&shop_schema(), &options(false));
        let doc = Document::parse(&xml).unwrap();

        let notes = column_element(&doc, "OrderLines", "Notes");
        assert_eq!(notes.attribute("type"), Some("xs:string"));
        assert!(xs_children(notes, "simpleType").is_empty());

        let total = column_element(&doc, "Orders", "Total");
        assert_eq!(total.attribute("type"), Some("xs:decimal"));
    }

    #[test]
    fn test_composite_primary_key_emits_fields_in_order() {
        let xml = render(&shop_schema(), &options(false));
        let doc = Document::parse(&xml).unwrap();
        let dataset = xs_child(doc.root_element(), "element");

        let uniques = xs_children(dataset, "unique");
        assert_eq!(uniques.len(), 2);

        let order = uniques
            .iter()
            .find(|u| u.attribute("name") == Some("PK_Order"))
            .unwrap();
        assert_eq!(xs_child(*order, "selector").attribute("xpath"), Some(".//mstns:OrderLines"));
        let fields: Vec<_> = xs_children(*order, "field")
            .iter()
            .map(|f| f.attribute("xpath").unwrap())
            .collect();
        assert_eq!(fields, ["mstns:OrderId", "mstns:LineNo"]);
    }

    #[test]
    fn test_structure_counts_match_model() {
        let schema = shop_schema();
        for layout in [
            Layout::default(),
            Layout {
                dataset_choice: false,
                column_group: ColumnGroup::Sequence,
            },
        ] {
            let xml = render(&schema, &XsdOptions { layout, ..options(true) });
            let doc = Document::parse(&xml).unwrap();

            assert_eq!(table_elements(&doc).len(), schema.tables.len());
            let uniques = doc
                .descendants()
                .filter(|n| n.has_tag_name((SCHEMA_NAMESPACE, "unique")))
                .count();
            assert_eq!(uniques, schema.primary_keys.len());

            for table in table_elements(&doc) {
                let complex = xs_child(table, "complexType");
                assert_eq!(xs_children(complex, layout.column_group.element_name()).len(), 1);
            }
        }
    }

    #[test]
    fn test_relationships_disabled_leaves_no_metadata() {
        let schema = shop_schema();
        assert!(!schema.foreign_keys.is_empty());

        let xml = render(&schema, &options(false));
        assert!(!xml.contains("msdata"));
        assert!(!xml.contains(METADATA_NAMESPACE));
        assert!(!xml.contains("annotation"));
        assert!(Document::parse(&xml).is_ok());
    }

    #[test]
    fn test_relationships_enabled_annotates_foreign_keys() {
        let xml = render(&shop_schema(), &options(true));
        let doc = Document::parse(&xml).unwrap();
        let root = doc.root_element();

        assert_eq!(root.lookup_namespace_uri(Some("msdata")), Some(METADATA_NAMESPACE));

        let appinfo = xs_child(xs_child(root, "annotation"), "appinfo");
        let relationships: Vec<_> = appinfo.children().filter(|n| n.is_element()).collect();
        assert_eq!(relationships.len(), 1);

        let rel = relationships[0];
        assert!(rel.has_tag_name((METADATA_NAMESPACE, "Relationship")));
        assert_eq!(rel.attribute("name"), Some("FK_OrderLines_Orders"));
        assert_eq!(rel.attribute((METADATA_NAMESPACE, "parent")), Some("Orders"));
        assert_eq!(rel.attribute((METADATA_NAMESPACE, "child")), Some("OrderLines"));
        assert_eq!(rel.attribute((METADATA_NAMESPACE, "parentkey")), Some("Id"));
        assert_eq!(rel.attribute((METADATA_NAMESPACE, "childkey")), Some("OrderId"));

        let unique = xs_child(xs_child(root, "element"), "unique");
        assert_eq!(unique.attribute((METADATA_NAMESPACE, "PrimaryKey")), Some("true"));
    }

    #[test]
    fn test_guid_column_gets_pattern_restriction() {
        let xml = render(&shop_schema(), &options(true));
        let doc = Document::parse(&xml).unwrap();

        let id = column_element(&doc, "Orders", "Id");
        assert_eq!(id.attribute("type"), None);
        assert_eq!(id.attribute((METADATA_NAMESPACE, "DataType")), Some("System.Guid"));

        let restriction = xs_child(xs_child(id, "simpleType"), "restriction");
        assert_eq!(restriction.attribute("base"), Some("xs:string"));
        let pattern = xs_child(restriction, "pattern").attribute("value").unwrap();

        // XSD patterns match the whole value
        let anchored = regex::Regex::new(&format!("^(?:{})$", pattern)).unwrap();
        assert!(anchored.is_match("12345678-1234-1234-1234-123456789abc"));
        assert!(anchored.is_match("ABCDEF01-2345-6789-ABCD-EF0123456789"));
        assert!(!anchored.is_match("not-a-guid"));
        assert!(!anchored.is_match("12345678-1234-1234-1234-123456789abcd"));
    }

    #[test]
    fn test_guid_shape_wins_over_max_length() {
        let mut schema = users_schema();
        schema.tables[0]
            .columns
            .push(column("Token", "uniqueidentifier", false, Some(36), false));
        let xml = render(&schema, &options(false));
        let doc = Document::parse(&xml).unwrap();

        let token = column_element(&doc, "Users", "Token");
        let restriction = xs_child(xs_child(token, "simpleType"), "restriction");
        assert_eq!(xs_children(restriction, "pattern").len(), 1);
        assert!(xs_children(restriction, "maxLength").is_empty());
        assert_eq!(xs_child(restriction, "pattern").attribute("value"), Some(GUID_PATTERN));
    }

    #[test]
    fn test_identity_column_without_relationships_has_plain_type() {
        let xml = render(&users_schema(), &options(false));
        let doc = Document::parse(&xml).unwrap();

        let id = column_element(&doc, "Users", "Id");
        assert_eq!(id.attribute("type"), Some("xs:int"));
        let names: Vec<_> = id.attributes().map(|a| a.name()).collect();
        assert_eq!(names, ["name", "minOccurs", "maxOccurs", "type"]);
        assert!(!xml.contains("AutoIncrement"));
    }

    #[test]
    fn test_special_characters_in_names_stay_well_formed() {
        let mut schema = users_schema();
        schema.tables[0].columns.push(column("R&D \"Notes\"", "text", true, None, false));
        let xml = render(&schema, &options(false));
        let doc = Document::parse(&xml).unwrap();
        column_element(&doc, "Users", "R&D \"Notes\"");
    }

    #[test]
    fn test_empty_schema_is_well_formed() {
        let xml = render(&Schema::default(), &options(true));
        let doc = Document::parse(&xml).unwrap();
        assert!(table_elements(&doc).is_empty());
    }

    #[test]
    fn test_file_output_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("shop.xsd");

        write_schema_file(&users_schema(), &options(false), &path).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        assert!(first.contains("PK_Users"));

        write_schema_file(&shop_schema(), &options(false), &path).unwrap();
        let second = fs::read_to_string(&path).unwrap();
        assert!(second.contains("PK_Order"));
        assert!(!second.contains("PK_Users"));

        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_sink_failure_is_a_write_error() {
        #[derive(Debug)]
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = write_schema(&users_schema(), &options(false), Broken).unwrap_err();
        assert!(matches!(err, Error::Write(_)));
    }
}
