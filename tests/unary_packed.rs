//! Integration tests for the packed UnaryOp program.

mod common;

use common::assert_structurally_valid;
use packgl::activation::{ELU, RELU, RELU6};
use packgl::kernels::{UnaryOp, UnaryOpPackedProgram};
use packgl::params::UnaryParams;
use packgl::program::KernelProgram;

#[test]
fn test_every_builtin_op() {
    let ops = [
        UnaryOp::Linear,
        UnaryOp::Relu,
        UnaryOp::Relu6,
        UnaryOp::Elu,
        UnaryOp::Sigmoid,
    ];
    for op in ops {
        let program = UnaryOpPackedProgram::new(UnaryParams::new(&[2, 5]).unwrap(), op.clone()).unwrap();
        let d = program.descriptor();
        assert_eq!(d.name, "UnaryOpPacked");
        assert_eq!(d.input_names, ["A"]);
        assert_eq!(d.output_shape.as_slice(), &[2, 5]);
        assert!(d.source.starts_with("vec4 unaryOperation(vec4 x) {"));
        assert!(d.source.contains("vec4 y = unaryOperation(x);"));
        assert_structurally_valid(&d.source);
        d.verify().unwrap();
    }
}

#[test]
fn test_nan_preserving_snippets() {
    for snippet in [RELU, RELU6, ELU] {
        let op = UnaryOp::Custom(snippet.to_owned());
        assert_eq!(op.snippet(), snippet);
    }
    let relu = UnaryOpPackedProgram::new(UnaryParams::new(&[4]).unwrap(), UnaryOp::Relu)
        .unwrap()
        .descriptor()
        .source;
    assert!(relu.contains("isnan"));
}

#[test]
fn test_any_rank() {
    for shape in [&[7][..], &[2, 3], &[2, 3, 4], &[1, 2, 3, 4], &[1, 1, 2, 3, 4]] {
        let d = UnaryOpPackedProgram::new(UnaryParams::new(shape).unwrap(), UnaryOp::Sigmoid)
            .unwrap()
            .descriptor();
        assert_eq!(d.output_rank(), shape.len());
    }
    assert!(UnaryParams::new(&[]).is_err());
    assert!(UnaryParams::new(&[3, -1]).is_err());
}
