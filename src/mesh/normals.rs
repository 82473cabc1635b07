//! Fixed 256-direction normal codebook.
//!
//! Meshes store one byte per normal alongside the raw normals. Decoding is a
//! table lookup; encoding picks the entry with the largest dot product, the
//! lowest index winning ties. A few directions appear twice in the table, so
//! only the first occurrence of each is ever produced by [`encode_normal`].

use crate::util::Vec3;

/// Number of codebook entries.
pub const NORMAL_TABLE_LEN: usize = 256;

/// The codebook, indexed by the stored byte.
pub static NORMAL_TABLE: [Vec3; NORMAL_TABLE_LEN] = [
    Vec3::new(0.565061, -0.270644, -0.779396),
    Vec3::new(-0.309804, -0.731114, 0.607860),
    Vec3::new(-0.867412, 0.472957, 0.154619),
    Vec3::new(-0.757488, 0.498188, -0.421925),
    Vec3::new(0.306834, -0.915340, 0.260778),
    Vec3::new(0.098754, 0.639153, -0.762713),
    Vec3::new(0.713706, -0.558862, -0.422252),
    Vec3::new(-0.890431, -0.407603, -0.202466),
    Vec3::new(0.848050, -0.487612, -0.207475),
    Vec3::new(-0.232226, 0.776855, 0.585293),
    Vec3::new(-0.940195, 0.304490, -0.152706),
    Vec3::new(0.602019, -0.491878, -0.628991),
    Vec3::new(-0.096835, -0.494354, -0.863850),
    Vec3::new(0.026630, -0.323659, -0.945799),
    Vec3::new(0.019208, 0.909386, 0.415510),
    Vec3::new(0.854440, 0.491730, 0.167731),
    Vec3::new(-0.418835, 0.866521, -0.271512),
    Vec3::new(0.465024, 0.409667, 0.784809),
    Vec3::new(-0.674391, -0.691087, -0.259992),
    Vec3::new(0.303858, -0.869270, -0.389922),
    Vec3::new(0.991333, 0.090061, -0.095640),
    Vec3::new(-0.275924, -0.369550, 0.887298),
    Vec3::new(0.426545, -0.465962, 0.775202),
    Vec3::new(-0.482741, -0.873278, -0.065920),
    Vec3::new(0.063616, 0.932012, -0.356800),
    Vec3::new(0.624786, -0.061315, 0.778385),
    Vec3::new(-0.530300, 0.416850, 0.738253),
    Vec3::new(0.312144, -0.757028, -0.573999),
    Vec3::new(0.399288, -0.587091, -0.704197),
    Vec3::new(-0.132698, 0.482877, 0.865576),
    Vec3::new(0.950966, 0.306530, 0.041268),
    Vec3::new(-0.015923, -0.144300, 0.989406),
    Vec3::new(-0.407522, -0.854193, 0.322925),
    Vec3::new(-0.932398, 0.220464, 0.286408),
    Vec3::new(0.477509, 0.876580, 0.059936),
    Vec3::new(0.337133, 0.932606, -0.128796),
    Vec3::new(-0.638117, 0.199338, 0.743687),
    Vec3::new(-0.677454, 0.445349, 0.585423),
    Vec3::new(-0.446715, 0.889059, -0.100099),
    Vec3::new(-0.410024, 0.909168, 0.072759),
    Vec3::new(0.708462, 0.702103, -0.071641),
    Vec3::new(-0.048801, -0.903683, -0.425411),
    Vec3::new(-0.513681, -0.646901, 0.563606),
    Vec3::new(-0.080022, 0.000676, -0.996793),
    Vec3::new(0.066966, -0.991150, -0.114615),
    Vec3::new(-0.245220, 0.639318, -0.728793),
    Vec3::new(0.250978, 0.855979, 0.452006),
    Vec3::new(-0.123547, 0.982443, -0.139791),
    Vec3::new(-0.794825, 0.030254, -0.606084),
    Vec3::new(-0.772905, 0.547941, 0.319967),
    Vec3::new(0.916347, 0.369614, -0.153928),
    Vec3::new(-0.388203, 0.105395, 0.915527),
    Vec3::new(-0.700468, -0.709334, 0.078677),
    Vec3::new(-0.816193, 0.390455, 0.425880),
    Vec3::new(-0.043007, 0.769222, -0.637533),
    Vec3::new(0.911444, 0.113150, 0.395560),
    Vec3::new(0.845801, 0.156091, -0.510153),
    Vec3::new(0.829801, -0.029340, 0.557287),
    Vec3::new(0.259529, 0.416263, 0.871418),
    Vec3::new(0.231128, -0.845982, 0.480515),
    Vec3::new(-0.626203, -0.646168, 0.436277),
    Vec3::new(-0.197047, -0.065791, 0.978184),
    Vec3::new(-0.255692, -0.637488, -0.726794),
    Vec3::new(0.530662, -0.844385, -0.073567),
    Vec3::new(-0.779887, 0.617067, -0.104899),
    Vec3::new(0.739908, 0.113984, 0.662982),
    Vec3::new(-0.218801, 0.930194, -0.294729),
    Vec3::new(-0.374231, 0.818666, 0.435589),
    Vec3::new(-0.720250, -0.028285, 0.693137),
    Vec3::new(0.075389, 0.415049, 0.906670),
    Vec3::new(-0.539724, -0.106620, 0.835063),
    Vec3::new(-0.452612, -0.754669, -0.474991),
    Vec3::new(0.682822, 0.581234, -0.442629),
    Vec3::new(0.002435, -0.618462, -0.785811),
    Vec3::new(-0.397631, 0.110766, -0.910835),
    Vec3::new(0.133935, -0.985438, 0.104754),
    Vec3::new(0.759098, -0.608004, 0.232595),
    Vec3::new(-0.825239, -0.256087, 0.503388),
    Vec3::new(0.101693, -0.565568, 0.818408),
    Vec3::new(0.386377, 0.793546, -0.470104),
    Vec3::new(-0.520516, -0.840690, 0.149346),
    Vec3::new(-0.784549, -0.479672, 0.392935),
    Vec3::new(-0.325322, -0.927581, -0.183735),
    Vec3::new(-0.069294, -0.428541, 0.900861),
    Vec3::new(0.993354, -0.115023, -0.004288),
    Vec3::new(-0.123896, -0.700568, 0.702747),
    Vec3::new(-0.438031, -0.120880, -0.890795),
    Vec3::new(0.063314, 0.813233, 0.578484),
    Vec3::new(0.322045, 0.889086, -0.325289),
    Vec3::new(-0.133521, 0.875063, -0.465228),
    Vec3::new(0.637155, 0.564814, 0.524422),
    Vec3::new(0.260092, -0.669353, 0.695930),
    Vec3::new(0.953195, 0.040485, -0.299634),
    Vec3::new(-0.840665, -0.076509, 0.536124),
    Vec3::new(-0.971350, 0.202093, 0.125047),
    Vec3::new(-0.804307, -0.396312, -0.442749),
    Vec3::new(-0.936746, 0.069572, 0.343027),
    Vec3::new(0.426545, -0.465962, 0.775202),
    Vec3::new(0.794542, -0.227450, 0.563000),
    Vec3::new(-0.892172, 0.091169, -0.442399),
    Vec3::new(-0.312654, 0.541264, 0.780564),
    Vec3::new(0.590603, -0.735618, -0.331743),
    Vec3::new(-0.098040, -0.986713, 0.129558),
    Vec3::new(0.569646, 0.283078, -0.771603),
    Vec3::new(0.431051, -0.407385, -0.805129),
    Vec3::new(-0.162087, -0.938749, -0.304104),
    Vec3::new(0.241533, -0.359509, 0.901341),
    Vec3::new(-0.576191, 0.614939, 0.538380),
    Vec3::new(-0.025110, 0.085740, 0.996001),
    Vec3::new(-0.352693, -0.198168, 0.914515),
    Vec3::new(-0.604577, 0.700711, 0.378802),
    Vec3::new(0.465024, 0.409667, 0.784809),
    Vec3::new(-0.254684, -0.030474, -0.966544),
    Vec3::new(-0.604789, 0.791809, 0.085259),
    Vec3::new(-0.705147, -0.399298, 0.585943),
    Vec3::new(0.185691, 0.017236, -0.982457),
    Vec3::new(0.044588, 0.973094, 0.226052),
    Vec3::new(-0.405463, 0.642367, 0.650357),
    Vec3::new(-0.563959, 0.599136, -0.568319),
    Vec3::new(0.367162, -0.072253, -0.927347),
    Vec3::new(0.960429, -0.213570, -0.178783),
    Vec3::new(-0.192629, 0.906005, 0.376893),
    Vec3::new(-0.199718, -0.359865, -0.911378),
    Vec3::new(0.485072, 0.121233, -0.866030),
    Vec3::new(0.467163, -0.874294, 0.131792),
    Vec3::new(-0.638953, -0.716603, 0.279677),
    Vec3::new(-0.622710, 0.047813, -0.780990),
    Vec3::new(0.828724, -0.054433, -0.557004),
    Vec3::new(0.130241, 0.991080, 0.028245),
    Vec3::new(0.310995, -0.950076, -0.025242),
    Vec3::new(0.818118, 0.275336, 0.504850),
    Vec3::new(0.676328, 0.387023, 0.626733),
    Vec3::new(-0.100433, 0.495114, -0.863004),
    Vec3::new(-0.949609, -0.240681, -0.200786),
    Vec3::new(-0.102610, 0.261831, -0.959644),
    Vec3::new(-0.845732, -0.493136, 0.203850),
    Vec3::new(0.672617, -0.738838, 0.041290),
    Vec3::new(0.380465, 0.875938, 0.296613),
    Vec3::new(-0.811223, 0.262027, -0.522742),
    Vec3::new(-0.074423, -0.775670, -0.626736),
    Vec3::new(-0.286499, 0.755850, -0.588735),
    Vec3::new(0.291182, -0.276189, -0.915933),
    Vec3::new(-0.638117, 0.199338, 0.743687),
    Vec3::new(0.439922, -0.864433, -0.243359),
    Vec3::new(0.177649, 0.206919, 0.962094),
    Vec3::new(0.277107, 0.948521, 0.153361),
    Vec3::new(0.507629, 0.661918, -0.551523),
    Vec3::new(-0.503110, -0.579308, -0.641313),
    Vec3::new(0.600522, 0.736495, -0.311364),
    Vec3::new(-0.691096, -0.715301, -0.103592),
    Vec3::new(-0.041083, -0.858497, 0.511171),
    Vec3::new(0.207773, -0.480062, -0.852274),
    Vec3::new(0.795719, 0.464614, 0.388543),
    Vec3::new(-0.100433, 0.495114, -0.863004),
    Vec3::new(0.703249, 0.065157, -0.707951),
    Vec3::new(-0.324171, -0.941112, 0.096024),
    Vec3::new(-0.134933, -0.940212, 0.312722),
    Vec3::new(-0.438240, 0.752088, -0.492249),
    Vec3::new(0.964762, -0.198855, 0.172311),
    Vec3::new(-0.831799, 0.196807, 0.519015),
    Vec3::new(-0.508008, 0.819902, 0.263986),
    Vec3::new(0.471075, -0.001146, 0.882092),
    Vec3::new(0.919512, 0.246162, -0.306435),
    Vec3::new(-0.960050, 0.279828, -0.001187),
    Vec3::new(0.110232, -0.847535, -0.519165),
    Vec3::new(0.208229, 0.697360, 0.685806),
    Vec3::new(-0.199680, -0.560621, 0.803637),
    Vec3::new(0.170135, -0.679985, -0.713214),
    Vec3::new(0.758371, -0.494907, 0.424195),
    Vec3::new(0.077734, -0.755978, 0.649965),
    Vec3::new(0.612831, -0.672475, 0.414987),
    Vec3::new(0.142776, 0.836698, -0.528726),
    Vec3::new(-0.765185, 0.635778, 0.101382),
    Vec3::new(0.669873, -0.419737, 0.612447),
    Vec3::new(0.593549, 0.194879, 0.780847),
    Vec3::new(0.646930, 0.752173, 0.125368),
    Vec3::new(0.837721, 0.545266, -0.030127),
    Vec3::new(0.541505, 0.768070, 0.341820),
    Vec3::new(0.760679, -0.365715, -0.536301),
    Vec3::new(0.381516, 0.640377, 0.666605),
    Vec3::new(0.565794, -0.072415, -0.821361),
    Vec3::new(-0.466072, -0.401588, 0.788356),
    Vec3::new(0.987146, 0.096290, 0.127560),
    Vec3::new(0.509709, -0.688886, -0.515396),
    Vec3::new(-0.135132, -0.988046, -0.074192),
    Vec3::new(0.600499, 0.476471, -0.642166),
    Vec3::new(-0.732326, -0.275320, -0.622815),
    Vec3::new(-0.881141, -0.470404, 0.048078),
    Vec3::new(0.051548, 0.601042, 0.797553),
    Vec3::new(0.402027, -0.763183, 0.505891),
    Vec3::new(0.404233, -0.208288, 0.890624),
    Vec3::new(-0.311793, 0.343843, 0.885752),
    Vec3::new(0.098132, -0.937014, 0.335223),
    Vec3::new(0.537158, 0.830585, -0.146936),
    Vec3::new(0.725277, 0.298172, -0.620538),
    Vec3::new(-0.882025, 0.342976, -0.323110),
    Vec3::new(-0.668829, 0.424296, -0.610443),
    Vec3::new(-0.408835, -0.476442, -0.778368),
    Vec3::new(0.809472, 0.397249, -0.432375),
    Vec3::new(-0.909184, -0.205938, -0.361903),
    Vec3::new(0.866930, -0.347934, -0.356895),
    Vec3::new(0.911660, -0.141281, -0.385897),
    Vec3::new(-0.431404, -0.844074, -0.318480),
    Vec3::new(-0.950593, -0.073496, 0.301614),
    Vec3::new(-0.719716, 0.626915, -0.298305),
    Vec3::new(-0.779887, 0.617067, -0.104899),
    Vec3::new(-0.475899, -0.542630, 0.692151),
    Vec3::new(0.081952, -0.157248, -0.984153),
    Vec3::new(0.923990, -0.381662, -0.024025),
    Vec3::new(-0.957998, 0.120979, -0.260008),
    Vec3::new(0.306601, 0.227975, -0.924134),
    Vec3::new(-0.141244, 0.989182, 0.039601),
    Vec3::new(0.077097, 0.186288, -0.979466),
    Vec3::new(-0.630407, -0.259801, 0.731499),
    Vec3::new(0.718150, 0.637408, 0.279233),
    Vec3::new(0.340946, 0.110494, 0.933567),
    Vec3::new(-0.396671, 0.503020, -0.767869),
    Vec3::new(0.636943, -0.245005, 0.730942),
    Vec3::new(-0.849605, -0.518660, -0.095724),
    Vec3::new(-0.388203, 0.105395, 0.915527),
    Vec3::new(-0.280671, -0.776541, -0.564099),
    Vec3::new(-0.601680, 0.215451, -0.769131),
    Vec3::new(-0.660112, -0.632371, -0.405412),
    Vec3::new(0.921096, 0.284072, 0.266242),
    Vec3::new(0.074850, -0.300846, 0.950731),
    Vec3::new(0.943952, -0.067062, 0.323198),
    Vec3::new(-0.917838, -0.254589, 0.304561),
    Vec3::new(0.889843, -0.409008, 0.202219),
    Vec3::new(-0.565849, 0.753721, -0.334246),
    Vec3::new(0.791460, 0.555918, -0.254060),
    Vec3::new(0.261936, 0.703590, -0.660568),
    Vec3::new(-0.234406, 0.952084, 0.196444),
    Vec3::new(0.111205, 0.979492, -0.168014),
    Vec3::new(-0.869844, -0.109095, -0.481113),
    Vec3::new(-0.337728, -0.269701, -0.901777),
    Vec3::new(0.366793, 0.408875, -0.835634),
    Vec3::new(-0.098749, 0.261316, 0.960189),
    Vec3::new(-0.272379, -0.847100, 0.456324),
    Vec3::new(-0.319506, 0.287444, -0.902935),
    Vec3::new(0.873383, -0.294109, 0.388203),
    Vec3::new(-0.088950, 0.710450, 0.698104),
    Vec3::new(0.551238, -0.786552, 0.278340),
    Vec3::new(0.724436, -0.663575, -0.186712),
    Vec3::new(0.529741, -0.606539, 0.592861),
    Vec3::new(-0.949743, -0.282514, 0.134809),
    Vec3::new(0.155047, 0.419442, -0.894443),
    Vec3::new(-0.562653, -0.329139, -0.758346),
    Vec3::new(0.816407, -0.576953, 0.024576),
    Vec3::new(0.178550, -0.950242, -0.255266),
    Vec3::new(0.479571, 0.706691, 0.520192),
    Vec3::new(0.391687, 0.559884, -0.730145),
    Vec3::new(0.724872, -0.205570, -0.657496),
    Vec3::new(-0.663196, -0.517587, -0.540624),
    Vec3::new(-0.660054, -0.122486, -0.741165),
    Vec3::new(-0.531989, 0.374711, -0.759328),
    Vec3::new(0.194979, -0.059120, 0.979024),
];

/// Direction stored under `code`.
#[inline]
pub fn decode_normal(code: u8) -> Vec3 {
    NORMAL_TABLE[code as usize]
}

/// Nearest codebook entry by angle.
pub fn encode_normal(normal: Vec3) -> u8 {
    let mut best = 0u8;
    let mut best_dot = -1.0e31f32;
    for (i, entry) in NORMAL_TABLE.iter().enumerate() {
        let dot = normal.dot(*entry);
        if dot > best_dot {
            best = i as u8;
            best_dot = dot;
        }
    }
    best
}

/// Encode a whole normal array.
pub fn encode_normals(normals: &[Vec3]) -> Vec<u8> {
    normals.iter().map(|n| encode_normal(*n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_occurrence(code: u8) -> u8 {
        let v = decode_normal(code);
        NORMAL_TABLE.iter().position(|e| *e == v).unwrap() as u8
    }

    #[test]
    fn test_decode_then_encode() {
        for i in 0..=255u8 {
            let code = encode_normal(decode_normal(i));
            assert_eq!(code, first_occurrence(i), "code {i}");
            assert_eq!(decode_normal(code), decode_normal(i));
        }
    }

    #[test]
    fn test_duplicate_entries_resolve_to_first() {
        assert_eq!(decode_normal(97), decode_normal(22));
        assert_eq!(encode_normal(decode_normal(97)), 22);
        assert_eq!(encode_normal(decode_normal(111)), 17);
    }

    #[test]
    fn test_nearest_direction() {
        let up = Vec3::Z;
        let code = encode_normal(up);
        let best = decode_normal(code).dot(up);
        assert!(NORMAL_TABLE.iter().all(|e| e.dot(up) <= best));
        assert!(best > 0.95);
    }

    #[test]
    fn test_table_is_unit_length() {
        for v in NORMAL_TABLE.iter() {
            assert!((v.length() - 1.0).abs() < 1e-3);
        }
    }
}
