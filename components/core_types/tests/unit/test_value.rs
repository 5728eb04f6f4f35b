//! Unit tests for Value enum

use core_types::{Function, JsError, JsObject, PlainObject, Value};

#[cfg(test)]
mod value_creation_tests {
    use super::*;

    #[test]
    fn test_value_default_is_undefined() {
        assert_eq!(Value::default(), Value::Undefined);
    }

    #[test]
    fn test_value_from_primitives() {
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from(7), Value::Smi(7));
        assert_eq!(Value::from(1.5), Value::Double(1.5));
        assert_eq!(Value::from("s"), Value::String("s".to_string()));
        assert_eq!(Value::from(String::from("t")), Value::String("t".to_string()));
    }

    #[test]
    fn test_value_from_vec_is_array() {
        let value = Value::from(vec![Value::Smi(1)]);
        assert_eq!(value.as_array(), Some(&[Value::Smi(1)][..]));
    }

    #[test]
    fn test_value_from_error_unwraps_thrown_value() {
        assert_eq!(Value::from(JsError::throw(Value::Smi(3))), Value::Smi(3));
        let described = JsError::type_error("bad");
        assert_eq!(Value::from(described.clone()), Value::Error(described));
    }
}

#[cfg(test)]
mod value_equality_tests {
    use super::*;

    #[test]
    fn test_arrays_compare_by_content() {
        let a = Value::array(vec![Value::Smi(1), Value::from("x")]);
        let b = Value::array(vec![Value::Smi(1), Value::from("x")]);
        assert_eq!(a, b);
        assert_ne!(a, Value::array(vec![Value::Smi(1)]));
    }

    #[test]
    fn test_objects_compare_by_identity() {
        let a = Value::object(PlainObject::new());
        let b = Value::object(PlainObject::new());
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_functions_compare_by_identity() {
        let f = Function::new(|_| Ok(Value::Undefined));
        let g = Function::new(|_| Ok(Value::Undefined));
        assert_eq!(Value::from(f.clone()), Value::from(f));
        assert_ne!(
            Value::function(|_| Ok(Value::Undefined)),
            Value::from(g)
        );
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        assert_ne!(Value::Double(f64::NAN), Value::Double(f64::NAN));
    }

    #[test]
    fn test_different_variants_are_not_equal() {
        assert_ne!(Value::Smi(1), Value::Double(1.0));
        assert_ne!(Value::Undefined, Value::Null);
    }
}

#[cfg(test)]
mod value_accessor_tests {
    use super::*;

    #[test]
    fn test_as_function() {
        let value = Value::function(|args| Ok(Value::Smi(args.len() as i32)));
        let f = value.as_function().unwrap();
        assert_eq!(f.call(vec![Value::Null, Value::Null]).unwrap(), Value::Smi(2));
        assert!(Value::Smi(1).as_function().is_none());
    }

    #[test]
    fn test_as_object() {
        let value = Value::object(PlainObject::new().with("k", Value::Smi(1)));
        let object = value.as_object().unwrap();
        assert_eq!(object.get("k").unwrap(), Value::Smi(1));
        assert!(Value::Null.as_object().is_none());
    }

    #[test]
    fn test_as_array() {
        assert!(Value::array(vec![]).as_array().unwrap().is_empty());
        assert!(Value::from("abc").as_array().is_none());
    }
}

#[cfg(test)]
mod value_conversion_tests {
    use super::*;

    #[test]
    fn test_type_of() {
        assert_eq!(Value::from("x").type_of(), "string");
        assert_eq!(Value::array(vec![]).type_of(), "object");
        assert_eq!(Value::object(PlainObject::new()).type_of(), "object");
        assert_eq!(Value::function(|_| Ok(Value::Null)).type_of(), "function");
    }

    #[test]
    fn test_display_numbers() {
        assert_eq!(Value::Double(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Double(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::Smi(-4).to_string(), "-4");
    }

    #[test]
    fn test_debug_hides_host_objects() {
        assert_eq!(format!("{:?}", Value::object(PlainObject::new())), "Object(...)");
        assert_eq!(format!("{:?}", Value::Smi(1)), "Smi(1)");
    }
}
