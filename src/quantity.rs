/**************************************************************************/
/*  This file is part of SMOKEPREP.                                       */
/*                                                                        */
/*  Copyright (C) 2025                                                    */
/*    CEA (Commissariat à l'énergie atomique et aux énergies              */
/*         alternatives)                                                  */
/*                                                                        */
/*  you can redistribute it and/or modify it under the terms of the GNU   */
/*  Lesser General Public License as published by the Free Software       */
/*  Foundation, version 2.1.                                              */
/*                                                                        */
/*  It is distributed in the hope that it will be useful,                 */
/*  but WITHOUT ANY WARRANTY; without even the implied warranty of        */
/*  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the         */
/*  GNU Lesser General Public License for more details.                   */
/*                                                                        */
/*  See the GNU Lesser General Public License version 2.1                 */
/*  for more details (enclosed in the file licenses/LGPLv2.1).            */
/*                                                                        */
/**************************************************************************/

//! Physical quantities carried by slices, smoke volumes and boundary data

use serde::Serialize;

/// A named physical field, as declared in the `.smv` file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Quantity {
    /// Human readable name, e.g. `TEMPERATURE`
    pub name: String,
    /// Short name used by smokeview
    pub short_name: String,
    /// Unit of the values
    pub unit: String,
}

impl Quantity {
    /// Creates a quantity
    pub fn new(name: &str, short_name: &str, unit: &str) -> Self {
        Quantity {
            name: name.trim().to_owned(),
            short_name: short_name.trim().to_owned(),
            unit: unit.trim().to_owned(),
        }
    }

    /// Name of the directory exports of this quantity go to: lowercase, spaces replaced by
    /// underscores.
    /// ```
    /// use smokeprep::quantity::Quantity;
    /// assert_eq!(Quantity::new("Mass Fraction", "", "").dir_name(), "mass_fraction");
    /// ```
    pub fn dir_name(&self) -> String {
        self.name.to_lowercase().replace(' ', "_")
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.name, self.unit)
    }
}

#[test]
fn dir_names() {
    assert_eq!(Quantity::new("Temperature", "temp", "C").dir_name(), "temperature");
    assert_eq!(Quantity::new("TEMPERATURE", "temp", "C").dir_name(), "temperature");
    assert_eq!(
        Quantity::new(" SOOT DENSITY ", "rho", "mg/m3").dir_name(),
        "soot_density"
    );
    assert_eq!(
        Quantity::new("Mass Fraction", "Y", "kg/kg").dir_name(),
        "mass_fraction"
    );
}
