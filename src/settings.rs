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

//! Reader behaviour shared by loading and exporting.

use std::fmt::Display;

/// How the reader reacts to unreadable input.
///
/// Built once by the caller and handed to every loading and exporting function, so that two
/// simulations can be processed with different settings in the same process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderSettings {
    /// Skip unreadable records with a warning instead of failing.
    pub ignore_errors: bool,
    /// Log details about every data file that is read.
    pub debug: bool,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        ReaderSettings {
            ignore_errors: true,
            debug: false,
        }
    }
}

impl ReaderSettings {
    /// Settings that turn every unreadable record into an error.
    pub fn strict() -> Self {
        ReaderSettings {
            ignore_errors: false,
            ..Self::default()
        }
    }

    /// Returns `Ok(None)` instead of the error when errors are ignored. `what` names the record
    /// in the warning.
    pub fn recover<T>(
        &self,
        what: impl Display,
        res: anyhow::Result<T>,
    ) -> anyhow::Result<Option<T>> {
        match res {
            Ok(x) => Ok(Some(x)),
            Err(e) if self.ignore_errors => {
                tracing::warn!("skipping {}: {:#}", what, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[test]
fn recover_depends_on_ignore_errors() {
    let lenient = ReaderSettings::default();
    let strict = ReaderSettings::strict();
    assert_eq!(lenient.recover("x", Ok(3)).unwrap(), Some(3));
    assert_eq!(strict.recover("x", Ok(3)).unwrap(), Some(3));
    let failing = || -> anyhow::Result<u32> { anyhow::bail!("corrupt") };
    assert_eq!(lenient.recover("x", failing()).unwrap(), None);
    assert!(strict.recover("x", failing()).is_err());
}
