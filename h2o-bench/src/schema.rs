use datafusion::arrow::datatypes::{DataType as ArrowDataType, Field, Schema, SchemaRef};
use h2o_dataset::{LogicalType, TableSchema};
use std::sync::Arc;

/// Convert a logical column type to the Arrow type used for CSV ingestion
pub fn logical_to_arrow_type(logical_type: &LogicalType) -> ArrowDataType {
    match logical_type {
        LogicalType::Categorical => ArrowDataType::Dictionary(
            Box::new(ArrowDataType::Int32),
            Box::new(ArrowDataType::Utf8),
        ),
        LogicalType::Int32 => ArrowDataType::Int32,
        LogicalType::Float64 => ArrowDataType::Float64,
    }
}

/// Create Arrow schema from a benchmark table declaration
pub fn create_arrow_schema(table: &TableSchema) -> SchemaRef {
    let fields: Vec<Field> = table
        .columns()
        .map(|(name, logical_type)| {
            Field::new(
                name,
                logical_to_arrow_type(&logical_type),
                true, // the generator writes NA for missing v3 values
            )
        })
        .collect();

    Arc::new(Schema::new(fields))
}
