//! CSV export of the audit log and CSV import of categories.

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::CsvError;

/// UTF-8 byte order mark, written so spreadsheet tools pick the right encoding.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header of the audit log export.
pub const LOG_EXPORT_HEADER: [&str; 7] = [
    "ID",
    "Usuário",
    "Ação",
    "Tabela",
    "ID Registro",
    "Data/Hora",
    "Detalhes",
];

/// One audit log line to export.
#[derive(Debug, Clone, PartialEq)]
pub struct LogExportRow {
    /// Log ID.
    pub id_log: i32,
    /// User name, if the user still exists.
    pub usuario: Option<String>,
    /// Action description.
    pub acao: String,
    /// Affected table.
    pub tabela: Option<String>,
    /// Affected record.
    pub id_registro: Option<i32>,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Structured details.
    pub detalhes: Option<Value>,
}

/// Writes the audit log as CSV, starting with a UTF-8 BOM.
///
/// # Errors
/// `CsvError::Write` if a record cannot be written.
pub fn export_logs(rows: &[LogExportRow]) -> Result<Vec<u8>, CsvError> {
    let mut writer = WriterBuilder::new().from_writer(UTF8_BOM.to_vec());
    writer.write_record(LOG_EXPORT_HEADER)?;

    for row in rows {
        let detalhes = row
            .detalhes
            .as_ref()
            .filter(|v| !v.is_null())
            .map(Value::to_string)
            .unwrap_or_default();
        writer.write_record([
            row.id_log.to_string(),
            row.usuario.clone().unwrap_or_else(|| "N/A".to_string()),
            row.acao.clone(),
            row.tabela.clone().unwrap_or_default(),
            row.id_registro.map(|id| id.to_string()).unwrap_or_default(),
            row.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            detalhes,
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| CsvError::Write(e.error().to_string()))
}

/// A category read from an import file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryImportRow {
    /// Line in the file (header is line 1).
    #[serde(skip)]
    pub line: usize,
    /// Category name.
    pub categoria: String,
    /// State.
    pub uf: Option<String>,
    /// Cost center.
    pub master: Option<String>,
    /// Group.
    pub grupo: Option<String>,
    /// Classification code.
    pub cod_class: Option<String>,
    /// Cost class.
    pub classe_custo: Option<String>,
}

/// Rows read from an import file plus per-line problems.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryImport {
    /// Valid rows.
    pub rows: Vec<CategoryImportRow>,
    /// One message per rejected line.
    pub errors: Vec<String>,
}

struct Columns {
    categoria: usize,
    uf: Option<usize>,
    master: Option<usize>,
    grupo: Option<usize>,
    cod_class: Option<usize>,
    classe_custo: Option<usize>,
}

impl Columns {
    fn from_header(header: &StringRecord) -> Result<Self, CsvError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        Ok(Self {
            categoria: find("categoria").ok_or(CsvError::MissingColumn("categoria"))?,
            uf: find("uf"),
            master: find("master"),
            grupo: find("grupo"),
            cod_class: find("cod_class"),
            classe_custo: find("classe_custo"),
        })
    }
}

/// Reads categories from CSV bytes.
///
/// Accepts `,` or `;` as delimiter and an optional BOM. Only the
/// `categoria` column is required. Lines with an empty `categoria` are
/// reported in `errors` and skipped.
///
/// # Errors
/// `CsvError` when the file is not UTF-8, has no `categoria` column or no data rows.
pub fn parse_categories(bytes: &[u8]) -> Result<CategoryImport, CsvError> {
    let content = std::str::from_utf8(bytes).map_err(|_| CsvError::Encoding)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut reader = ReaderBuilder::new()
        .delimiter(detect_delimiter(content))
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let columns = Columns::from_header(reader.headers()?)?;
    let mut import = CategoryImport::default();
    let mut seen_rows = 0usize;

    for (index, record) in reader.records().enumerate() {
        let line = index + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                import.errors.push(format!("Linha {line}: {e}"));
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }
        seen_rows += 1;

        let text = |col: Option<usize>| {
            col.and_then(|c| record.get(c))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let Some(categoria) = text(Some(columns.categoria)) else {
            import
                .errors
                .push(format!("Linha {line}: campo 'categoria' é obrigatório"));
            continue;
        };

        import.rows.push(CategoryImportRow {
            line,
            categoria,
            uf: text(columns.uf),
            master: text(columns.master),
            grupo: text(columns.grupo),
            cod_class: text(columns.cod_class),
            classe_custo: text(columns.classe_custo),
        });
    }

    if seen_rows == 0 && import.errors.is_empty() {
        return Err(CsvError::Empty);
    }
    Ok(import)
}

fn detect_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or_default();
    if header.matches(';').count() > header.matches(',').count() {
        b';'
    } else {
        b','
    }
}
