//! # kkit Record Formatting
//!
//! Renders header, entity records, fixed GUI boilerplate and footer of a
//! GENESIS kkit (version 11) flat dump file.
//!
//! Readers of this format are column-positional: field order and spacing
//! below are part of the format, not presentation.
//!
//! ## Numbers
//!
//! Every number goes through [`Num`], which reproduces the C stream default
//! (`%g`, six significant digits): `100`, `0.01`, `1e-15`, `6.02214e+23`.

use crate::annotation::Annotation;
use crate::estimate::SimTimes;
use crate::primitives::AVOGADRO;
use crate::view::{CompartmentView, PoolView, ReactionView};
use std::fmt;

/// Significant digits of the default C++ stream float format.
const PRECISION: usize = 6;

/// `strftime` layout of C `ctime`, used for the `Saved on` line.
pub const CTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

// =============================================================================
// NUMBER RENDERING
// =============================================================================

/// A float rendered in `%g` form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Num(pub f64);

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = self.0;
        if x.is_nan() {
            return f.write_str("nan");
        }
        if x.is_infinite() {
            return f.write_str(if x < 0.0 { "-inf" } else { "inf" });
        }
        if x == 0.0 {
            return f.write_str(if x.is_sign_negative() { "-0" } else { "0" });
        }

        // The exponent is taken after rounding to PRECISION digits, so
        // 999999.7 switches to scientific form like printf does.
        let sci = format!("{:.*e}", PRECISION - 1, x);
        let Some((mantissa, exp)) = sci.split_once('e') else {
            return write!(f, "{}", x);
        };
        let Ok(exp) = exp.parse::<i32>() else {
            return write!(f, "{}", x);
        };

        if exp < -4 || exp >= PRECISION as i32 {
            let sign = if exp < 0 { '-' } else { '+' };
            write!(
                f,
                "{}e{}{:02}",
                trim_fraction(mantissa),
                sign,
                exp.unsigned_abs()
            )
        } else {
            let decimals = (PRECISION as i32 - 1 - exp) as usize;
            let fixed = format!("{:.*}", decimals, x);
            f.write_str(trim_fraction(&fixed))
        }
    }
}

/// Drop trailing zeros (and a dangling point) from a decimal fraction.
fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

// =============================================================================
// HEADER
// =============================================================================

const SCHEMA_DECLARATIONS: &str = "\
initdump -version 3 -ignoreorphans 1
simobjdump table input output alloced step_mode stepsize x y z
simobjdump xtree path script namemode sizescale
simobjdump xcoredraw xmin xmax ymin ymax
simobjdump xtext editable
simobjdump xgraph xmin xmax ymin ymax overlay
simobjdump xplot pixflags script fg ysquish do_slope wy
simobjdump group xtree_fg_req xtree_textfg_req plotfield expanded movealone \\
  link savename file version md5sum mod_save_flag x y z
simobjdump geometry size dim shape outside xtree_fg_req xtree_textfg_req x y z
simobjdump kpool DiffConst CoInit Co n nInit mwt nMin vol slave_enable \\
  geomname xtree_fg_req xtree_textfg_req x y z
simobjdump kreac kf kb notes xtree_fg_req xtree_textfg_req x y z
simobjdump kenz CoComplexInit CoComplex nComplexInit nComplex vol k1 k2 k3 \\
  keepconc usecomplex notes xtree_fg_req xtree_textfg_req link x y z
simobjdump stim level1 width1 delay1 level2 width2 delay2 baselevel trig_time \\
  trig_mode notes xtree_fg_req xtree_textfg_req is_running x y z
simobjdump xtab input output alloced step_mode stepsize notes editfunc \\
  xtree_fg_req xtree_textfg_req baselevel last_x last_y is_running x y z
simobjdump kchan perm gmax Vm is_active use_nernst notes xtree_fg_req \\
  xtree_textfg_req x y z
simobjdump transport input output alloced step_mode stepsize dt delay clock \\
  kf xtree_fg_req xtree_textfg_req x y z
simobjdump proto x y z
";

/// File header: version banner, timing assignments and schema declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub times: SimTimes,
    pub default_volume: f64,
    /// Human-readable generation time; the only non-deterministic line.
    pub saved_on: String,
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let SimTimes {
            run_time,
            sim_dt,
            plot_dt,
        } = self.times;
        f.write_str("//genesis\n// kkit Version 11 flat dumpfile\n\n")?;
        writeln!(f, "// Saved on {}\n", self.saved_on)?;
        f.write_str("include kkit {argv 1}\n")?;
        writeln!(f, "FASTDT = {}", Num(sim_dt))?;
        writeln!(f, "SIMDT = {}", Num(sim_dt))?;
        writeln!(f, "CONTROLDT = {}", Num(plot_dt))?;
        writeln!(f, "PLOTDT = {}", Num(plot_dt))?;
        writeln!(f, "MAXTIME = {}", Num(run_time))?;
        f.write_str("TRANSIENT_TIME = 2\nVARIABLE_DT_FLAG = 0\n")?;
        writeln!(f, "DEFAULT_VOL = {}", Num(self.default_volume))?;
        f.write_str("VERSION = 11.0\nsetfield /file/modpath value ~/scripts/modules\nkparms\n\n")?;
        f.write_str(SCHEMA_DECLARATIONS)
    }
}

// =============================================================================
// ENTITY RECORDS
// =============================================================================

/// `simundump geometry`, one per compartment, followed by a blank line.
#[derive(Debug, Clone, Copy)]
pub struct GeometryRecord<'a>(pub &'a CompartmentView);

impl fmt::Display for GeometryRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.0;
        writeln!(
            f,
            "simundump geometry /{}/geometry 0 {} {} sphere \"\" white black 0 0 0\n",
            c.name,
            Num(c.volume),
            c.dimensions
        )
    }
}

/// `simundump kpool`.
///
/// `mwt` and `nMin` are always zero and `slave_enable` is always 0: pools
/// driven by a stimulus table are written as ordinary pools.
#[derive(Debug, Clone, Copy)]
pub struct PoolRecord<'a> {
    pub pool: &'a PoolView,
    pub annotation: &'a Annotation,
}

impl PoolRecord<'_> {
    /// The kkit `vol` column: volume scaled to molecules per micromolar.
    #[must_use]
    pub fn volume_scale(&self) -> f64 {
        self.pool.volume * AVOGADRO * 1e-3
    }
}

impl fmt::Display for PoolRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.pool;
        let a = self.annotation;
        writeln!(
            f,
            "simundump kpool /{par}/{name} 0 {diff} {co_init} {co} {n} {n_init} 0 0 {vol} 0 \
             {par}/geometry {color} {text} {x} {y} 0",
            par = p.parent_name,
            name = p.name,
            diff = Num(p.diff_const),
            co_init = Num(p.conc_init),
            co = Num(p.conc),
            n = Num(p.n),
            n_init = Num(p.n_init),
            vol = Num(self.volume_scale()),
            color = a.color,
            text = a.text_color,
            x = Num(a.x),
            y = Num(a.y),
        )
    }
}

/// `simundump kreac`.
#[derive(Debug, Clone, Copy)]
pub struct ReacRecord<'a> {
    pub reaction: &'a ReactionView,
    pub annotation: &'a Annotation,
}

impl fmt::Display for ReacRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.reaction;
        let a = self.annotation;
        writeln!(
            f,
            "simundump kreac /{}/{} 0 {} {} \"\" {} {} {} {} 0",
            r.parent_name,
            r.name,
            Num(r.kf),
            Num(r.kb),
            a.color,
            a.text_color,
            Num(a.x),
            Num(a.y)
        )
    }
}

/// `simundump xplot` for a recorder under `/graphs` or `/moregraphs`.
#[derive(Debug, Clone, Copy)]
pub struct PlotRecord<'a> {
    /// Recorder path rendered from its graph namespace, e.g. `/graphs/conc1/A.Co`.
    pub path: &'a str,
    pub color: &'a str,
}

impl fmt::Display for PlotRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "simundump xplot {} 3 524288 \\\n\"delete_plot.w <s> <d>; edit_plot.D <w>\" {} 0 0 1",
            self.path, self.color
        )
    }
}

// =============================================================================
// FIXED BLOCKS
// =============================================================================

/// Graph windows, edit canvas, tree view and notes declarations.
pub const GUI_BLOCK: &str = "\
simundump xgraph /graphs/conc1 0 0 99 0.001 0.999 0
simundump xgraph /graphs/conc2 0 0 100 0 1 0
simundump xgraph /moregraphs/conc3 0 0 100 0 1 0
simundump xgraph /moregraphs/conc4 0 0 100 0 1 0
simundump xcoredraw /edit/draw 0 -6 4 -2 6
simundump xtree /edit/draw/tree 0 \\
  /kinetics/#[],/kinetics/#[]/#[],/kinetics/#[]/#[]/#[][TYPE!=proto],/kinetics/#[]/#[]/#[][TYPE!=linkinfo]/##[] \"edit_elm.D <v>; drag_from_edit.w <d> <S> <x> <y> <z>\" auto 0.6
simundump xtext /file/notes 0 1
";

/// Terminator: blank line, `enddump`, `complete_loading`.
pub const FOOTER: &str = "\nenddump\ncomplete_loading\n";

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityId;
    use crate::EntityKind;

    #[test]
    fn num_matches_stream_defaults() {
        let cases: &[(f64, &str)] = &[
            (100.0, "100"),
            (0.01, "0.01"),
            (0.05, "0.05"),
            (2.0, "2"),
            (0.5, "0.5"),
            (1.0e-15, "1e-15"),
            (1.6667e-19, "1.6667e-19"),
            (123456.0, "123456"),
            (1234567.0, "1.23457e+06"),
            (0.0001, "0.0001"),
            (0.00001, "1e-05"),
            (-3.25, "-3.25"),
            (AVOGADRO, "6.02214e+23"),
            (0.0, "0"),
        ];
        for (x, expected) in cases {
            assert_eq!(Num(*x).to_string(), *expected, "formatting {}", x);
        }
    }

    #[test]
    fn num_rounding_can_change_exponent() {
        assert_eq!(Num(999_999.7).to_string(), "1e+06");
        assert_eq!(Num(0.000_099_999_99).to_string(), "0.0001");
    }

    #[test]
    fn num_non_finite() {
        assert_eq!(Num(f64::INFINITY).to_string(), "inf");
        assert_eq!(Num(f64::NEG_INFINITY).to_string(), "-inf");
        assert_eq!(Num(f64::NAN).to_string(), "nan");
    }

    fn header() -> Header {
        Header {
            times: SimTimes {
                run_time: 100.0,
                sim_dt: 0.01,
                plot_dt: 0.5,
            },
            default_volume: 1e-15,
            saved_on: "Thu Jan  1 00:00:00 1970".to_string(),
        }
    }

    #[test]
    fn header_starts_with_genesis_banner() {
        let text = header().to_string();
        assert!(text.starts_with("//genesis\n// kkit Version 11 flat dumpfile\n\n"));
        assert!(text.contains("// Saved on Thu Jan  1 00:00:00 1970\n\ninclude kkit {argv 1}\n"));
    }

    #[test]
    fn header_timing_assignments() {
        let text = header().to_string();
        assert!(text.contains(
            "FASTDT = 0.01\nSIMDT = 0.01\nCONTROLDT = 0.5\nPLOTDT = 0.5\nMAXTIME = 100\n"
        ));
        assert!(text.contains("TRANSIENT_TIME = 2\nVARIABLE_DT_FLAG = 0\nDEFAULT_VOL = 1e-15\n"));
        assert!(text.contains("VERSION = 11.0\n"));
    }

    #[test]
    fn header_declares_record_shapes() {
        let text = header().to_string();
        assert!(text.contains("initdump -version 3 -ignoreorphans 1\n"));
        assert_eq!(text.matches("simobjdump ").count(), 16);
        assert!(text.ends_with("simobjdump proto x y z\n"));
    }

    fn pool() -> PoolView {
        PoolView {
            id: EntityId(3),
            name: "A".to_string(),
            path: "/model/kinetics/A".to_string(),
            parent_name: "kinetics".to_string(),
            parent_kind: EntityKind::CubeMesh,
            diff_const: 0.0,
            conc_init: 1.0,
            conc: 0.5,
            n_init: 600.0,
            n: 300.0,
            volume: 1e-18,
        }
    }

    #[test]
    fn geometry_record_layout() {
        let c = CompartmentView {
            id: EntityId(2),
            name: "kinetics".to_string(),
            path: "/model/kinetics".to_string(),
            volume: 1.6667e-19,
            dimensions: 3,
        };
        assert_eq!(
            GeometryRecord(&c).to_string(),
            "simundump geometry /kinetics/geometry 0 1.6667e-19 3 sphere \"\" white black 0 0 0\n\n"
        );
    }

    #[test]
    fn pool_record_layout() {
        let p = pool();
        let a = Annotation {
            x: 2.0,
            y: -1.5,
            ..Annotation::default()
        };
        let record = PoolRecord {
            pool: &p,
            annotation: &a,
        };
        assert_eq!(
            record.to_string(),
            "simundump kpool /kinetics/A 0 0 1 0.5 300 600 0 0 602.214 0 \
             kinetics/geometry cyan black 2 -1.5 0\n"
        );
    }

    #[test]
    fn pool_volume_scale() {
        let p = pool();
        let a = Annotation::default();
        let record = PoolRecord {
            pool: &p,
            annotation: &a,
        };
        let expected = 1e-18 * AVOGADRO * 1e-3;
        assert!((record.volume_scale() - expected).abs() < 1e-9);
    }

    #[test]
    fn reac_record_layout() {
        let r = ReactionView {
            id: EntityId(4),
            name: "r1".to_string(),
            path: "/model/kinetics/r1".to_string(),
            parent_name: "kinetics".to_string(),
            kf: 0.1,
            kb: 0.05,
        };
        let a = Annotation {
            color: "white".to_string(),
            text_color: "blue".to_string(),
            x: 1.0,
            y: 4.0,
            notes: String::new(),
        };
        assert_eq!(
            ReacRecord {
                reaction: &r,
                annotation: &a
            }
            .to_string(),
            "simundump kreac /kinetics/r1 0 0.1 0.05 \"\" white blue 1 4 0\n"
        );
    }

    #[test]
    fn plot_record_layout() {
        let record = PlotRecord {
            path: "/graphs/conc1/A.Co",
            color: "red",
        };
        assert_eq!(
            record.to_string(),
            "simundump xplot /graphs/conc1/A.Co 3 524288 \\\n\
             \"delete_plot.w <s> <d>; edit_plot.D <w>\" red 0 0 1\n"
        );
    }

    #[test]
    fn footer_terminates_dump() {
        assert!(FOOTER.ends_with("enddump\ncomplete_loading\n"));
        assert!(FOOTER.starts_with('\n'));
    }
}
