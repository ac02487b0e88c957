//! CDL-like text rendering, modeled on `ncdump -h`.

use std::fmt::{self, Write};

use crate::schema::AttributeSet;

use super::{FileDescription, ScopeDescription};

impl fmt::Display for FileDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            writeln!(f, "netcdf {{")?;
        } else {
            writeln!(f, "netcdf {} {{", self.name)?;
        }
        write_scope(f, &self.root, "", "// global attributes:")?;
        for group in &self.groups {
            writeln!(f)?;
            writeln!(f, "group: {} {{", group.name)?;
            write_scope(f, group, "  ", "// group attributes:")?;
            writeln!(f, "  }} // group {}", group.name)?;
        }
        writeln!(f, "}}")
    }
}

fn write_scope<W: Write>(
    out: &mut W,
    scope: &ScopeDescription,
    indent: &str,
    attributes_header: &str,
) -> fmt::Result {
    if !scope.attributes.is_empty() {
        writeln!(out, "{indent}{attributes_header}")?;
        write_attributes(out, indent, "", &scope.attributes)?;
    }

    if !scope.dimensions.is_empty() {
        writeln!(out, "{indent}dimensions:")?;
        for dim in &scope.dimensions {
            if dim.unlimited {
                writeln!(
                    out,
                    "{indent}\t{} = UNLIMITED ; // ({} currently)",
                    dim.name, dim.length
                )?;
            } else {
                writeln!(out, "{indent}\t{} = {} ;", dim.name, dim.length)?;
            }
        }
    }

    if !scope.variables.is_empty() {
        writeln!(out, "{indent}variables:")?;
        for var in &scope.variables {
            if var.dimensions.is_empty() {
                writeln!(out, "{indent}\t{} {} ;", var.dtype.cdl_name(), var.name)?;
            } else {
                writeln!(
                    out,
                    "{indent}\t{} {}({}) ;",
                    var.dtype.cdl_name(),
                    var.name,
                    var.dimensions.join(", ")
                )?;
            }
            write_attributes(out, indent, &var.name, &var.attributes)?;
        }
    }
    Ok(())
}

fn write_attributes<W: Write>(
    out: &mut W,
    indent: &str,
    owner: &str,
    attributes: &AttributeSet,
) -> fmt::Result {
    for attr in attributes {
        writeln!(out, "{indent}\t\t{owner}:{} = {} ;", attr.name, attr.value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::VariableDescription;
    use super::*;
    use crate::schema::DataType;
    use crate::store::DimensionInfo;

    #[test]
    fn test_render_layout() {
        let root = ScopeDescription {
            name: String::new(),
            attributes: AttributeSet::new().with("title", "Precipitable water"),
            dimensions: vec![
                DimensionInfo {
                    name: "time".into(),
                    length: 3,
                    unlimited: true,
                },
                DimensionInfo {
                    name: "latitude".into(),
                    length: 10,
                    unlimited: false,
                },
            ],
            variables: vec![VariableDescription {
                name: "pwat".into(),
                dtype: DataType::Float64,
                dimensions: vec!["time".into(), "latitude".into()],
                shape: vec![3, 10],
                attributes: AttributeSet::new().with("units", "kg m-2"),
            }],
        };
        let group = ScopeDescription {
            name: "blah".into(),
            attributes: AttributeSet::new().with("scale", vec![1i64, 2]),
            ..Default::default()
        };
        let description = FileDescription {
            name: "pwat".into(),
            root,
            groups: vec![group],
        };

        let text = description.to_string();
        let expected = "netcdf pwat {\n\
// global attributes:\n\
\t\t:title = \"Precipitable water\" ;\n\
dimensions:\n\
\ttime = UNLIMITED ; // (3 currently)\n\
\tlatitude = 10 ;\n\
variables:\n\
\tdouble pwat(time, latitude) ;\n\
\t\tpwat:units = \"kg m-2\" ;\n\
\n\
group: blah {\n\
  // group attributes:\n\
  \t\t:scale = 1, 2 ;\n\
  } // group blah\n\
}\n";
        assert_eq!(text, expected);
    }
}
