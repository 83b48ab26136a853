//! Serialized ONNX fixtures, built with tract-onnx's protobuf types.

use prost::Message;
use tract_onnx::pb::tensor_shape_proto::{dimension, Dimension};
use tract_onnx::pb::{
    tensor_proto, type_proto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorProto,
    TensorShapeProto, TypeProto, ValueInfoProto,
};

/// Batch dimension of the fixture's input and output.
#[derive(Debug, Clone, Copy)]
pub enum Batch {
    /// `dim_param: "N"`, as most exporters write it.
    Symbolic,
    /// `dim_value: 1`.
    Fixed,
}

impl Batch {
    fn dimension(self) -> Dimension {
        match self {
            Batch::Symbolic => dim(dimension::Value::DimParam("N".to_string())),
            Batch::Fixed => dim(dimension::Value::DimValue(1)),
        }
    }
}

fn dim(value: dimension::Value) -> Dimension {
    Dimension {
        value: Some(value),
        ..Default::default()
    }
}

fn float_value(name: &str, dims: Vec<Dimension>) -> ValueInfoProto {
    ValueInfoProto {
        name: name.to_string(),
        r#type: Some(TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type: tensor_proto::DataType::Float as i32,
                shape: Some(TensorShapeProto { dim: dims }),
            })),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// `output = input @ [[0.0], [0.25]]`: a `[batch, 2] -> [batch, 1]` model that
/// ignores the sample and scales the gain by a quarter.
pub fn quarter_gain_onnx(batch: Batch) -> Vec<u8> {
    let graph = GraphProto {
        name: "quarter_gain".to_string(),
        node: vec![NodeProto {
            name: "matmul".to_string(),
            op_type: "MatMul".to_string(),
            input: vec!["input".to_string(), "weights".to_string()],
            output: vec!["output".to_string()],
            ..Default::default()
        }],
        initializer: vec![TensorProto {
            name: "weights".to_string(),
            dims: vec![2, 1],
            data_type: tensor_proto::DataType::Float as i32,
            float_data: vec![0.0, 0.25],
            ..Default::default()
        }],
        input: vec![float_value(
            "input",
            vec![batch.dimension(), dim(dimension::Value::DimValue(2))],
        )],
        output: vec![float_value(
            "output",
            vec![batch.dimension(), dim(dimension::Value::DimValue(1))],
        )],
        ..Default::default()
    };
    ModelProto {
        ir_version: 7,
        opset_import: vec![OperatorSetIdProto {
            domain: String::new(),
            version: 13,
        }],
        producer_name: "neurosat-tests".to_string(),
        graph: Some(graph),
        ..Default::default()
    }
    .encode_to_vec()
}
