use pg_upload_core::{ColumnAttribute, Inflector, SchemaBuild};

/// Name under which the naming extension is registered
pub const UPLOAD_COLUMN_INFLECTION: &str = "uploadColumn";
pub const UPLOAD_FIELD_SUFFIX: &str = "Upload";

/// Field name of the upload input for a column: `<columnField>Upload`
pub fn upload_column(inflector: &dyn Inflector, attr: &ColumnAttribute) -> String {
    format!("{}{}", inflector.column(attr), UPLOAD_FIELD_SUFFIX)
}

/// Upload field name as the host currently inflects it.
///
/// Goes through the `uploadColumn` extension registered with the host, so a
/// plugin that replaced it renames the field everywhere. Falls back to
/// [`upload_column`] when the extension was never registered.
pub fn upload_field_name(build: &dyn SchemaBuild, attr: &ColumnAttribute) -> String {
    let inflection = build
        .inflection_extensions()
        .get(UPLOAD_COLUMN_INFLECTION)
        .unwrap_or(upload_column);
    inflection(build.inflector(), attr)
}
