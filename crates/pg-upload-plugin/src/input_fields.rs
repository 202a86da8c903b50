//! Adds `<column>Upload` fields to generated row input types

use pg_upload_core::{
    ColumnAction, ColumnAttribute, InputField, InputFieldMap, InputObjectScope, SchemaBuild,
    Table, UploadError, UploadResult,
};

use crate::matcher::DefinitionMatcher;
use crate::naming::upload_field_name;
use crate::scalar::UPLOAD_TYPE_NAME;

/// New fields layered over a snapshot of the existing field set.
///
/// Every insertion checks the name against both the snapshot and the
/// fields added so far.
struct FieldLayer<'a> {
    snapshot: InputFieldMap,
    added: Vec<InputField>,
    table: &'a Table,
}

impl<'a> FieldLayer<'a> {
    fn over(snapshot: InputFieldMap, table: &'a Table) -> Self {
        Self {
            snapshot,
            added: Vec::new(),
            table,
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.snapshot.contains(name) || self.added.iter().any(|field| field.name == name)
    }

    fn with_field(mut self, field: InputField, attr: &ColumnAttribute) -> UploadResult<Self> {
        if self.contains(&field.name) {
            return Err(UploadError::DuplicateFieldName {
                table: self.table.qualified_name(),
                field_name: field.name,
                column: attr.name.clone(),
                hint: rename_hint(self.table, attr),
            });
        }
        self.added.push(field);
        Ok(self)
    }

    fn into_fields(self) -> UploadResult<InputFieldMap> {
        self.added
            .into_iter()
            .try_fold(self.snapshot, |fields, field| fields.extend_with(field))
    }
}

fn rename_hint(table: &Table, attr: &ColumnAttribute) -> String {
    format!(
        concat!(
            "You can rename this field with a 'Smart Comment':\n\n",
            "  comment on column \"{}\".\"{}\".\"{}\" is E'@name newNameHere';"
        ),
        table.namespace_name,
        table.name,
        attr.name
    )
}

/// Add an upload field for every eligible column of the row type's table.
///
/// Input types that do not represent a table row are returned unchanged.
pub fn inject_upload_fields(
    fields: InputFieldMap,
    build: &dyn SchemaBuild,
    scope: &InputObjectScope,
    matcher: &DefinitionMatcher,
) -> UploadResult<InputFieldMap> {
    let table = match scope.table.as_ref() {
        Some(table) if scope.is_pg_row_type && table.is_table() => table,
        _ => return Ok(fields),
    };
    let action = ColumnAction::for_scope(scope);

    let mut layer = FieldLayer::over(fields, table);
    for attr in &table.attributes {
        if !build.column_filter(attr, scope) {
            continue;
        }
        if build.omit(attr, action) {
            continue;
        }
        if attr.is_identity_always() {
            continue;
        }
        if matcher.match_attribute(attr)?.is_none() {
            continue;
        }

        let field_name = upload_field_name(build, attr);
        tracing::debug!(
            input_type = %scope.type_name,
            field = %field_name,
            column = %attr.describe(),
            action = action.as_str(),
            "Adding upload field"
        );
        layer = layer.with_field(
            InputField {
                name: field_name,
                description: attr.description.clone(),
                type_name: UPLOAD_TYPE_NAME.to_string(),
                source_attribute: Some(attr.clone()),
                is_upload_field: true,
            },
            attr,
        )?;
    }

    layer.into_fields()
}
