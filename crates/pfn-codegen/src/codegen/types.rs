//! Surface type references to Python annotations.

use pfn_parser::ast::{TypeRef, TypeRefKind};

/// The Python annotation text for a surface type reference. Used for
/// dataclass fields and type aliases; semantics live entirely in the
/// type checker, so this mapping is cosmetic but stable.
pub(crate) fn type_ref_annotation(type_ref: &TypeRef) -> String {
    match &type_ref.kind {
        TypeRefKind::Simple { name, args } => {
            let mapped = map_type_name(name);
            if args.is_empty() {
                mapped.to_string()
            } else {
                let args: Vec<String> = args.iter().map(type_ref_annotation).collect();
                format!("{mapped}[{}]", args.join(", "))
            }
        }
        TypeRefKind::Fun { .. } => "Callable[[...], ...]".to_string(),
        TypeRefKind::Tuple(elements) => {
            if elements.is_empty() {
                return "None".to_string();
            }
            let elems: Vec<String> = elements.iter().map(type_ref_annotation).collect();
            format!("tuple[{}]", elems.join(", "))
        }
        TypeRefKind::Record(_) => "dict".to_string(),
    }
}

fn map_type_name(name: &str) -> &str {
    match name {
        "Int" => "int",
        "Float" => "float",
        "String" => "str",
        "Bool" => "bool",
        "Char" => "str",
        "List" => "list",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfn_common::span::Span;

    fn simple(name: &str, args: Vec<TypeRef>) -> TypeRef {
        TypeRef::new(
            TypeRefKind::Simple {
                name: name.to_string(),
                args,
            },
            Span::new(0, 0, 1, 1),
        )
    }

    #[test]
    fn primitives_map_to_python_builtins() {
        assert_eq!(type_ref_annotation(&simple("Int", vec![])), "int");
        assert_eq!(type_ref_annotation(&simple("String", vec![])), "str");
        assert_eq!(type_ref_annotation(&simple("Bool", vec![])), "bool");
    }

    #[test]
    fn applied_types_use_subscripts() {
        let list_int = simple("List", vec![simple("Int", vec![])]);
        assert_eq!(type_ref_annotation(&list_int), "list[int]");
    }

    #[test]
    fn user_types_pass_through() {
        assert_eq!(type_ref_annotation(&simple("Shape", vec![])), "Shape");
    }
}
