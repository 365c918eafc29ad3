//! SQL Server type names and their XSD primitive counterparts

/// SQL Server column types with a known XSD mapping
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SqlType {
    Bit,
    BigInt,
    Float,
    Int,
    Real,
    SmallInt,
    TinyInt,
    Date,
    Time,
    Timestamp,
    SmallDateTime,
    DateTime,
    SmallMoney,
    Numeric,
    Money,
    Decimal,
    VarBinary,
    Image,
    Binary,
    Xml,
    UniqueIdentifier,
    VarChar,
    Text,
    SysName,
    SqlVariant,
    NText,
    NChar,
    Char,
    NVarChar,
}

impl SqlType {
    /// Every mapped type, in mapping-table order
    pub const ALL: [SqlType; 29] = [
        SqlType::Bit,
        SqlType::BigInt,
        SqlType::Float,
        SqlType::Int,
        SqlType::Real,
        SqlType::SmallInt,
        SqlType::TinyInt,
        SqlType::Date,
        SqlType::Time,
        SqlType::Timestamp,
        SqlType::SmallDateTime,
        SqlType::DateTime,
        SqlType::SmallMoney,
        SqlType::Numeric,
        SqlType::Money,
        SqlType::Decimal,
        SqlType::VarBinary,
        SqlType::Image,
        SqlType::Binary,
        SqlType::Xml,
        SqlType::UniqueIdentifier,
        SqlType::VarChar,
        SqlType::Text,
        SqlType::SysName,
        SqlType::SqlVariant,
        SqlType::NText,
        SqlType::NChar,
        SqlType::Char,
        SqlType::NVarChar,
    ];

    /// Type name as reported by `INFORMATION_SCHEMA.COLUMNS.DATA_TYPE`
    pub fn name(self) -> &'static str {
        match self {
            SqlType::Bit => "bit",
            SqlType::BigInt => "bigint",
            SqlType::Float => "float",
            SqlType::Int => "int",
            SqlType::Real => "real",
            SqlType::SmallInt => "smallint",
            SqlType::TinyInt => "tinyint",
            SqlType::Date => "date",
            SqlType::Time => "time",
            SqlType::Timestamp => "timestamp",
            SqlType::SmallDateTime => "smalldatetime",
            SqlType::DateTime => "datetime",
            SqlType::SmallMoney => "smallmoney",
            SqlType::Numeric => "numeric",
            SqlType::Money => "money",
            SqlType::Decimal => "decimal",
            SqlType::VarBinary => "varbinary",
            SqlType::Image => "image",
            SqlType::Binary => "binary",
            SqlType::Xml => "xml",
            SqlType::UniqueIdentifier => "uniqueidentifier",
            SqlType::VarChar => "varchar",
            SqlType::Text => "text",
            SqlType::SysName => "sysname",
            SqlType::SqlVariant => "sql_variant",
            SqlType::NText => "ntext",
            SqlType::NChar => "nchar",
            SqlType::Char => "char",
            SqlType::NVarChar => "nvarchar",
        }
    }

    /// Look up a type by its SQL Server name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    /// XSD primitive used to represent values of this type
    pub fn xsd_type(self) -> XsdType {
        match self {
            SqlType::Bit => XsdType::Boolean,
            SqlType::BigInt => XsdType::Long,
            SqlType::Float => XsdType::Double,
            SqlType::Int => XsdType::Int,
            SqlType::Real => XsdType::Float,
            SqlType::SmallInt => XsdType::Short,
            SqlType::TinyInt => XsdType::UnsignedByte,

            SqlType::Date
            | SqlType::Time
            | SqlType::Timestamp
            | SqlType::SmallDateTime
            | SqlType::DateTime => XsdType::DateTime,

            SqlType::SmallMoney | SqlType::Numeric | SqlType::Money | SqlType::Decimal => {
                XsdType::Decimal
            }

            SqlType::VarBinary | SqlType::Image | SqlType::Binary => XsdType::Base64Binary,

            SqlType::Xml
            | SqlType::UniqueIdentifier
            | SqlType::VarChar
            | SqlType::Text
            | SqlType::SysName
            | SqlType::SqlVariant
            | SqlType::NText
            | SqlType::NChar
            | SqlType::Char
            | SqlType::NVarChar => XsdType::String,
        }
    }
}

/// XSD built-in primitive types emitted by the generator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum XsdType {
    Boolean,
    Long,
    Double,
    Int,
    Float,
    Short,
    UnsignedByte,
    DateTime,
    Decimal,
    Base64Binary,
    String,
}

impl XsdType {
    /// Local name inside the XML Schema namespace
    pub fn as_str(self) -> &'static str {
        match self {
            XsdType::Boolean => "boolean",
            XsdType::Long => "long",
            XsdType::Double => "double",
            XsdType::Int => "int",
            XsdType::Float => "float",
            XsdType::Short => "short",
            XsdType::UnsignedByte => "unsignedByte",
            XsdType::DateTime => "dateTime",
            XsdType::Decimal => "decimal",
            XsdType::Base64Binary => "base64Binary",
            XsdType::String => "string",
        }
    }
}

/// Map a SQL Server type name onto an XSD primitive.
///
/// Unrecognized names fall back to `string`.
pub fn convert_data_type(name: &str) -> XsdType {
    SqlType::from_name(name)
        .map(SqlType::xsd_type)
        .unwrap_or(XsdType::String)
}
